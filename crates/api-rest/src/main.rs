//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the medforms REST API server on its own, with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! This binary serves the full administrative HTTP surface (questionnaire and
//! question CRUD plus the organized-tree endpoint). The workspace's main
//! `medforms-run` binary serves a reduced surface for deployments that only
//! need listing and creation.

use axum::{
    extract::{Path as AxumPath, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::dto::{
    CreateQuestionReq, CreateQuestionnaireReq, DeleteRes, HealthRes, ListQuestionnairesRes,
    ListQuestionsRes, QuestionOptionDto, QuestionRes, QuestionTreeNodeRes, QuestionTreeRes,
    QuestionnaireRes, QuestionsByQuestionnaireReq, ResponsibleDto, UpdateQuestionReq,
    UpdateQuestionnaireReq,
};
use api_shared::HealthService;
use medforms_core::{
    config::form_data_dir_from_env_value, CoreConfig, EntityUuid, FormError, NewQuestion,
    NewQuestionnaire, NonEmptyText, Question, Questionnaire, QuestionnaireService,
    QuestionnaireUpdate, QuestionOption, QuestionStore, QuestionTreeNode, QuestionType,
    QuestionUpdate, RegistrationType, Responsible, ResponsibleRole,
};

/// Application state for the REST API server.
///
/// Shared by all request handlers: the resolved core configuration and the
/// optional API key guarding mutating access.
#[derive(Clone)]
struct AppState {
    cfg: Arc<CoreConfig>,
    api_key: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_questionnaires,
        create_questionnaire,
        get_questionnaire,
        update_questionnaire,
        delete_questionnaire,
        questionnaire_tree,
        questions_by_questionnaire,
        create_question,
        get_question,
        update_question,
        delete_question,
    ),
    components(schemas(
        HealthRes,
        ResponsibleDto,
        CreateQuestionnaireReq,
        UpdateQuestionnaireReq,
        QuestionnaireRes,
        ListQuestionnairesRes,
        QuestionOptionDto,
        QuestionsByQuestionnaireReq,
        CreateQuestionReq,
        UpdateQuestionReq,
        QuestionRes,
        ListQuestionsRes,
        QuestionTreeNodeRes,
        QuestionTreeRes,
        DeleteRes,
    ))
)]
struct ApiDoc;

/// Main entry point for the medforms REST API server.
///
/// # Environment Variables
/// - `MEDFORMS_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `FORM_DATA_DIR`: base directory for form data storage
/// - `MEDFORMS_NAMESPACE`: deployment namespace (default: "medforms.dev.1")
/// - `API_KEY`: when set, mutating and read endpoints other than `/health`
///   require a matching `x-api-key` header
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the form data directory does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDFORMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting medforms REST API on {}", addr);

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

    let state = AppState {
        cfg,
        api_key: std::env::var("API_KEY").ok().filter(|key| !key.is_empty()),
    };

    let api = Router::new()
        .route("/questionnaires", get(list_questionnaires))
        .route("/questionnaires", post(create_questionnaire))
        .route("/questionnaires/:id", get(get_questionnaire))
        .route("/questionnaires/:id", put(update_questionnaire))
        .route("/questionnaires/:id", delete(delete_questionnaire))
        .route("/questionnaires/:id/tree", get(questionnaire_tree))
        .route("/questions/by-questionnaire", post(questions_by_questionnaire))
        .route("/questions", post(create_question))
        .route("/questions/:id", get(get_question))
        .route("/questions/:id", put(update_question))
        .route("/questions/:id", delete(delete_question))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let app = Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rejects requests lacking the configured API key.
///
/// A no-op when no key is configured, so development deployments stay open.
async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };
    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    match api_shared::auth::validate_api_key(provided, expected) {
        Ok(()) => next.run(req).await,
        Err(_) => (StatusCode::UNAUTHORIZED, "Invalid API key").into_response(),
    }
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
/// Used for monitoring and load balancer health checks; never requires an
/// API key.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/questionnaires",
    responses(
        (status = 200, description = "List of questionnaires", body = ListQuestionnairesRes)
    )
)]
/// List all questionnaires
///
/// Unreadable metadata files are skipped (and logged) rather than failing the
/// listing.
#[axum::debug_handler]
async fn list_questionnaires(
    State(state): State<AppState>,
) -> Json<ListQuestionnairesRes> {
    let questionnaires = QuestionnaireService::new(state.cfg.clone())
        .list()
        .iter()
        .map(questionnaire_res)
        .collect();
    Json(ListQuestionnairesRes { questionnaires })
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
/// # Errors
/// Returns `400 Bad Request` if the title is blank, the user id is not a
/// canonical UUID, or a responsible entry is malformed.
#[axum::debug_handler]
async fn create_questionnaire(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionnaireReq>,
) -> Result<(StatusCode, Json<QuestionnaireRes>), (StatusCode, &'static str)> {
    let title = NonEmptyText::new(&req.title)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Title cannot be empty"))?;
    let user_id = EntityUuid::parse(&req.user_id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user UUID"))?;
    let responsibles = build_responsibles(req.responsibles)?;

    let service = QuestionnaireService::new(state.cfg.clone())
        .initialise(NewQuestionnaire {
            title,
            icon: req.icon,
            user_id,
            responsibles,
        })
        .map_err(|e| map_form_error("Create questionnaire", e))?;

    let questionnaire = service
        .read()
        .map_err(|e| map_form_error("Read questionnaire", e))?;
    Ok((StatusCode::CREATED, Json(questionnaire_res(&questionnaire))))
}

#[utoipa::path(
    get,
    path = "/questionnaires/{id}",
    responses(
        (status = 200, description = "Questionnaire retrieved", body = QuestionnaireRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Questionnaire not found")
    )
)]
/// Fetch one questionnaire's metadata
#[axum::debug_handler]
async fn get_questionnaire(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<QuestionnaireRes>, (StatusCode, &'static str)> {
    let questionnaire = QuestionnaireService::with_id(state.cfg.clone(), &id)
        .and_then(|service| service.read())
        .map_err(|e| map_form_error("Get questionnaire", e))?;
    Ok(Json(questionnaire_res(&questionnaire)))
}

#[utoipa::path(
    put,
    path = "/questionnaires/{id}",
    request_body = UpdateQuestionnaireReq,
    responses(
        (status = 200, description = "Questionnaire updated", body = QuestionnaireRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Questionnaire not found")
    )
)]
/// Update questionnaire metadata (title and/or icon)
#[axum::debug_handler]
async fn update_questionnaire(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateQuestionnaireReq>,
) -> Result<Json<QuestionnaireRes>, (StatusCode, &'static str)> {
    let title = match req.title {
        Some(title) => Some(
            NonEmptyText::new(&title)
                .map_err(|_| (StatusCode::BAD_REQUEST, "Title cannot be empty"))?,
        ),
        None => None,
    };

    let updated = QuestionnaireService::with_id(state.cfg.clone(), &id)
        .and_then(|service| service.update(QuestionnaireUpdate { title, icon: req.icon }))
        .map_err(|e| map_form_error("Update questionnaire", e))?;
    Ok(Json(questionnaire_res(&updated)))
}

#[utoipa::path(
    delete,
    path = "/questionnaires/{id}",
    responses(
        (status = 200, description = "Questionnaire deleted", body = DeleteRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Questionnaire not found")
    )
)]
/// Delete a questionnaire and all of its question records
#[axum::debug_handler]
async fn delete_questionnaire(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<DeleteRes>, (StatusCode, &'static str)> {
    QuestionnaireService::with_id(state.cfg.clone(), &id)
        .and_then(|service| service.delete())
        .map_err(|e| map_form_error("Delete questionnaire", e))?;
    Ok(Json(DeleteRes { success: true }))
}

#[utoipa::path(
    get,
    path = "/questionnaires/{id}/tree",
    responses(
        (status = 200, description = "Organized question hierarchy", body = QuestionTreeRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Questionnaire not found")
    )
)]
/// Fetch the organized question hierarchy of a questionnaire
///
/// Returns root questions sorted by order index, each with its recursively
/// organized `childQuestions`.
#[axum::debug_handler]
async fn questionnaire_tree(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<QuestionTreeRes>, (StatusCode, &'static str)> {
    let forest = QuestionStore::with_id(state.cfg.clone(), &id)
        .and_then(|store| store.organized())
        .map_err(|e| map_form_error("Questionnaire tree", e))?;
    Ok(Json(QuestionTreeRes {
        questions: tree_res(&forest),
    }))
}

#[utoipa::path(
    post,
    path = "/questions/by-questionnaire",
    request_body = QuestionsByQuestionnaireReq,
    responses(
        (status = 200, description = "Flat question records of the questionnaire", body = ListQuestionsRes)
    )
)]
/// List the flat question records of a questionnaire
///
/// A malformed or unknown questionnaire id is logged and answered with an
/// empty list, indistinguishable from a questionnaire with no questions yet.
#[axum::debug_handler]
async fn questions_by_questionnaire(
    State(state): State<AppState>,
    Json(req): Json<QuestionsByQuestionnaireReq>,
) -> Json<ListQuestionsRes> {
    let questions = match QuestionStore::with_id(state.cfg.clone(), &req.questionnaire_id)
        .and_then(|store| store.list())
    {
        Ok(questions) => questions.iter().map(question_res).collect(),
        Err(e) => {
            tracing::warn!(
                "Questions lookup for '{}' failed: {}",
                req.questionnaire_id,
                e
            );
            Vec::new()
        }
    };
    Json(ListQuestionsRes { questions })
}

#[utoipa::path(
    post,
    path = "/questions",
    request_body = CreateQuestionReq,
    responses(
        (status = 201, description = "Question created", body = QuestionRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Questionnaire not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a question record
///
/// When `orderIndex` is omitted, the next index within the target sibling
/// group is assigned automatically.
#[axum::debug_handler]
async fn create_question(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionReq>,
) -> Result<(StatusCode, Json<QuestionRes>), (StatusCode, &'static str)> {
    let questionnaire_id = EntityUuid::parse(&req.questionnaire_id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid questionnaire UUID"))?;
    let parent_question_id = match req.parent_question_id.as_deref() {
        Some(parent) => Some(
            EntityUuid::parse(parent)
                .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid parent question UUID"))?,
        ),
        None => None,
    };
    let text = NonEmptyText::new(&req.text)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Question text cannot be empty"))?;
    let question_type = parse_question_type(&req.question_type)?;
    let options = build_options(req.options)?;

    let store = QuestionStore::with_id(state.cfg.clone(), &req.questionnaire_id)
        .map_err(|e| map_form_error("Create question", e))?;
    let question = store
        .create(NewQuestion {
            questionnaire_id,
            parent_question_id,
            trigger_value: req.trigger_value,
            order_index: req.order_index,
            text,
            question_type,
            options,
        })
        .map_err(|e| map_form_error("Create question", e))?;
    Ok((StatusCode::CREATED, Json(question_res(&question))))
}

#[utoipa::path(
    get,
    path = "/questions/{id}",
    responses(
        (status = 200, description = "Question retrieved", body = QuestionRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Question not found")
    )
)]
/// Fetch a single question record by id
#[axum::debug_handler]
async fn get_question(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<QuestionRes>, (StatusCode, &'static str)> {
    let question_id = EntityUuid::parse(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid question UUID"))?;
    let (_store, question) = QuestionStore::locate(state.cfg.clone(), &question_id)
        .map_err(|e| map_form_error("Get question", e))?;
    Ok(Json(question_res(&question)))
}

#[utoipa::path(
    put,
    path = "/questions/{id}",
    request_body = UpdateQuestionReq,
    responses(
        (status = 200, description = "Question updated", body = QuestionRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Question not found")
    )
)]
/// Update a question record
///
/// Text, type, order index, trigger value and options may change; the parent
/// reference and owning questionnaire are immutable.
#[axum::debug_handler]
async fn update_question(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateQuestionReq>,
) -> Result<Json<QuestionRes>, (StatusCode, &'static str)> {
    let question_id = EntityUuid::parse(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid question UUID"))?;
    let update = build_question_update(req)?;

    let (store, _question) = QuestionStore::locate(state.cfg.clone(), &question_id)
        .map_err(|e| map_form_error("Update question", e))?;
    let updated = store
        .update(&question_id, update)
        .map_err(|e| map_form_error("Update question", e))?;
    Ok(Json(question_res(&updated)))
}

#[utoipa::path(
    delete,
    path = "/questions/{id}",
    responses(
        (status = 200, description = "Question deleted", body = DeleteRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Question not found")
    )
)]
/// Delete a single question record
///
/// Descendants are kept and become root questions the next time the
/// questionnaire is organized.
#[axum::debug_handler]
async fn delete_question(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<DeleteRes>, (StatusCode, &'static str)> {
    let question_id = EntityUuid::parse(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid question UUID"))?;
    let (store, _question) = QuestionStore::locate(state.cfg.clone(), &question_id)
        .map_err(|e| map_form_error("Delete question", e))?;
    store
        .delete(&question_id)
        .map_err(|e| map_form_error("Delete question", e))?;
    Ok(Json(DeleteRes { success: true }))
}

// Helper functions

/// Maps a core error onto an HTTP status, logging storage failures.
fn map_form_error(context: &str, e: FormError) -> (StatusCode, &'static str) {
    match e {
        FormError::InvalidInput(_) | FormError::Text(_) => {
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        FormError::QuestionnaireNotFound(_) => {
            (StatusCode::NOT_FOUND, "Questionnaire not found")
        }
        FormError::QuestionNotFound(_) => (StatusCode::NOT_FOUND, "Question not found"),
        other => {
            tracing::error!("{} error: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
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

fn question_res(question: &Question) -> QuestionRes {
    QuestionRes {
        id: question.id.to_string(),
        questionnaire_id: question.questionnaire_id.to_string(),
        parent_question_id: question
            .parent_question_id
            .as_ref()
            .map(EntityUuid::to_string),
        trigger_value: question.trigger_value.clone(),
        order_index: question.order_index,
        text: question.text.to_string(),
        question_type: question.question_type.to_string(),
        options: question
            .options
            .iter()
            .map(|option| QuestionOptionDto {
                label: option.label.to_string(),
                value: option.value.to_string(),
            })
            .collect(),
        created_at: question.created_at.to_rfc3339(),
    }
}

fn tree_res(nodes: &[QuestionTreeNode]) -> Vec<QuestionTreeNodeRes> {
    nodes
        .iter()
        .map(|node| QuestionTreeNodeRes {
            question: question_res(&node.question),
            child_questions: tree_res(&node.child_questions),
        })
        .collect()
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

fn parse_question_type(value: &str) -> Result<QuestionType, (StatusCode, &'static str)> {
    value
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Unknown question type"))
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

fn build_options(
    options: Vec<QuestionOptionDto>,
) -> Result<Vec<QuestionOption>, (StatusCode, &'static str)> {
    options
        .into_iter()
        .map(|option| {
            Ok(QuestionOption {
                label: NonEmptyText::new(&option.label)
                    .map_err(|_| (StatusCode::BAD_REQUEST, "Option label cannot be empty"))?,
                value: NonEmptyText::new(&option.value)
                    .map_err(|_| (StatusCode::BAD_REQUEST, "Option value cannot be empty"))?,
            })
        })
        .collect()
}

fn build_question_update(
    req: UpdateQuestionReq,
) -> Result<QuestionUpdate, (StatusCode, &'static str)> {
    let text = match req.text {
        Some(text) => Some(
            NonEmptyText::new(&text)
                .map_err(|_| (StatusCode::BAD_REQUEST, "Question text cannot be empty"))?,
        ),
        None => None,
    };
    let question_type = match req.question_type {
        Some(value) => Some(parse_question_type(&value)?),
        None => None,
    };
    let options = match req.options {
        Some(options) => Some(build_options(options)?),
        None => None,
    };
    Ok(QuestionUpdate {
        text,
        question_type,
        order_index: req.order_index,
        trigger_value: req.trigger_value,
        options,
    })
}
