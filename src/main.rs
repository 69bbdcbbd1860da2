use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::HealthService;
use api_shared::dto::{
    CreateQuestionnaireReq, HealthRes, ListQuestionnairesRes, QuestionnaireRes, ResponsibleDto,
};
use medforms_core::{
    CoreConfig, EntityUuid, NewQuestionnaire, NonEmptyText, Questionnaire, QuestionnaireService,
    RegistrationType, Responsible, ResponsibleRole, config::form_data_dir_from_env_value,
};

/// Application state shared across REST API handlers
///
/// Holds the core configuration resolved once at startup.
#[derive(Clone)]
struct AppState {
    cfg: Arc<CoreConfig>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_questionnaires, create_questionnaire),
    components(schemas(
        HealthRes,
        ListQuestionnairesRes,
        QuestionnaireRes,
        CreateQuestionnaireReq,
        ResponsibleDto
    ))
)]
struct ApiDoc;

/// Main entry point for the medforms application
///
/// Starts the REST server with the reduced deployment surface: health,
/// questionnaire listing and questionnaire creation. The full administrative
/// surface (question CRUD and the organized tree) lives in the
/// `medforms-api-rest` binary.
///
/// # Environment Variables
/// - `MEDFORMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FORM_DATA_DIR`: Directory for form data storage (default: "form_data")
/// - `MEDFORMS_NAMESPACE`: Deployment namespace (default: "medforms.dev.1")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medforms=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDFORMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting medforms REST on {}", rest_addr);

    let form_data_dir = form_data_dir_from_env_value(std::env::var("FORM_DATA_DIR").ok());
    let form_data_path = Path::new(&form_data_dir);
    if !form_data_path.exists() {
        anyhow::bail!(
            "Form data directory does not exist: {}",
            form_data_path.display()
        );
    }

    let namespace =
        std::env::var("MEDFORMS_NAMESPACE").unwrap_or_else(|_| "medforms.dev.1".into());
    let cfg = Arc::new(CoreConfig::new(form_data_path.to_path_buf(), namespace)?);

    let rest_app = Router::new()
        .route("/health", get(health))
        .route("/questionnaires", get(list_questionnaires))
        .route("/questionnaires", post(create_questionnaire))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { cfg });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the medforms service.
/// This endpoint is used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/questionnaires",
    responses(
        (status = 200, description = "List of questionnaires", body = ListQuestionnairesRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List all questionnaires in the system
///
/// Retrieves every questionnaire stored in the form data directory.
/// Questionnaires are stored in a sharded directory structure for efficient
/// access; entries whose metadata cannot be read are skipped.
///
/// # Returns
/// * `Ok(Json<ListQuestionnairesRes>)` - Questionnaires with their metadata
async fn list_questionnaires(
    State(state): State<AppState>,
) -> Result<Json<ListQuestionnairesRes>, (StatusCode, &'static str)> {
    let questionnaires = QuestionnaireService::new(state.cfg.clone())
        .list()
        .iter()
        .map(questionnaire_res)
        .collect();
    Ok(Json(ListQuestionnairesRes { questionnaires }))
}

#[utoipa::path(
    post,
    path = "/questionnaires",
    request_body = CreateQuestionnaireReq,
    responses(
        (status = 201, description = "Questionnaire created", body = QuestionnaireRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a new questionnaire
///
/// Creates a questionnaire with the provided title, icon, owning user and
/// responsible professionals. The metadata is stored as YAML in a sharded
/// directory structure under the configured form data directory, alongside an
/// empty question record file.
///
/// # Parameters
/// * `req` - Questionnaire creation request containing title, icon, userId and responsibles
///
/// # Returns
/// * `Ok(Json<QuestionnaireRes>)` - Created questionnaire with generated UUID
/// * `Err((StatusCode, &str))` - Bad request or internal server error
async fn create_questionnaire(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionnaireReq>,
) -> Result<(StatusCode, Json<QuestionnaireRes>), (StatusCode, &'static str)> {
    let title = NonEmptyText::new(&req.title)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Title cannot be empty"))?;
    let user_id = EntityUuid::parse(&req.user_id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user UUID"))?;
    let responsibles = build_responsibles(req.responsibles)?;

    let created = QuestionnaireService::new(state.cfg.clone())
        .initialise(NewQuestionnaire {
            title,
            icon: req.icon,
            user_id,
            responsibles,
        })
        .and_then(|service| service.read());
    match created {
        Ok(questionnaire) => Ok((StatusCode::CREATED, Json(questionnaire_res(&questionnaire)))),
        Err(e) => {
            tracing::error!("Create questionnaire error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

fn questionnaire_res(questionnaire: &Questionnaire) -> QuestionnaireRes {
    QuestionnaireRes {
        id: questionnaire.id.to_string(),
        title: questionnaire.title.to_string(),
        icon: questionnaire.icon.clone(),
        user_id: questionnaire.user_id.to_string(),
        responsibles: questionnaire
            .responsibles
            .iter()
            .map(|responsible| ResponsibleDto {
                name: responsible.name.to_string(),
                role: role_name(responsible.role).into(),
                registration_type: registration_type_name(responsible.registration_type).into(),
                registration_id: responsible.registration_id.to_string(),
            })
            .collect(),
        created_at: questionnaire.created_at.to_rfc3339(),
        updated_at: questionnaire.updated_at.to_rfc3339(),
    }
}

fn role_name(role: ResponsibleRole) -> &'static str {
    match role {
        ResponsibleRole::Doctor => "doctor",
        ResponsibleRole::Nurse => "nurse",
        ResponsibleRole::Technician => "technician",
        ResponsibleRole::Other => "other",
    }
}

fn registration_type_name(registration_type: RegistrationType) -> &'static str {
    match registration_type {
        RegistrationType::Crm => "crm",
        RegistrationType::Coren => "coren",
        RegistrationType::Other => "other",
    }
}

fn build_responsibles(
    responsibles: Vec<ResponsibleDto>,
) -> Result<Vec<Responsible>, (StatusCode, &'static str)> {
    responsibles
        .into_iter()
        .map(|responsible| {
            let role = match responsible.role.as_str() {
                "doctor" => ResponsibleRole::Doctor,
                "nurse" => ResponsibleRole::Nurse,
                "technician" => ResponsibleRole::Technician,
                "other" => ResponsibleRole::Other,
                _ => return Err((StatusCode::BAD_REQUEST, "Unknown responsible role")),
            };
            let registration_type = match responsible.registration_type.as_str() {
                "crm" => RegistrationType::Crm,
                "coren" => RegistrationType::Coren,
                "other" => RegistrationType::Other,
                _ => return Err((StatusCode::BAD_REQUEST, "Unknown registration type")),
            };
            Ok(Responsible {
                name: NonEmptyText::new(&responsible.name)
                    .map_err(|_| (StatusCode::BAD_REQUEST, "Responsible name cannot be empty"))?,
                role,
                registration_type,
                registration_id: NonEmptyText::new(&responsible.registration_id).map_err(
                    |_| (StatusCode::BAD_REQUEST, "Registration id cannot be empty"),
                )?,
            })
        })
        .collect()
}
