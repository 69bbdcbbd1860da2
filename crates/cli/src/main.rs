use std::sync::Arc;

use clap::{Parser, Subcommand};
use medforms_core::{
    config::form_data_dir_from_env_value, CoreConfig, EntityUuid, NewQuestion, NewQuestionnaire,
    NonEmptyText, QuestionnaireService, QuestionStore, QuestionTreeNode,
};

#[derive(Parser)]
#[command(name = "medforms")]
#[command(about = "medforms questionnaire administration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all questionnaires
    List,
    /// Create a questionnaire
    Create {
        /// Questionnaire title
        title: String,
        /// Owning user UUID
        user_uuid: String,
        /// Icon name (optional)
        #[arg(long, default_value = "clipboard")]
        icon: String,
    },
    /// Show a questionnaire's organized question hierarchy
    Show {
        /// Questionnaire UUID
        questionnaire_uuid: String,
    },
    /// Add a question to a questionnaire
    AddQuestion {
        /// Questionnaire UUID
        questionnaire_uuid: String,
        /// Question text
        text: String,
        /// Question type (text, textarea, number, date, radio, checkbox, select)
        #[arg(long, default_value = "text")]
        question_type: String,
        /// Parent question UUID (optional)
        #[arg(long)]
        parent: Option<String>,
        /// Answer on the parent that reveals this question (optional)
        #[arg(long)]
        trigger: Option<String>,
    },
    /// Remove a question from a questionnaire
    RemoveQuestion {
        /// Questionnaire UUID
        questionnaire_uuid: String,
        /// Question UUID
        question_uuid: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config_from_env()?;

    match cli.command {
        Some(Commands::List) => {
            let questionnaires = QuestionnaireService::new(cfg).list();
            if questionnaires.is_empty() {
                println!("No questionnaires found.");
            } else {
                for questionnaire in questionnaires {
                    println!(
                        "ID: {}, Title: {}, Created: {}",
                        questionnaire.id, questionnaire.title, questionnaire.created_at
                    );
                }
            }
        }
        Some(Commands::Create {
            title,
            user_uuid,
            icon,
        }) => {
            let new = NewQuestionnaire {
                title: NonEmptyText::new(&title)?,
                icon,
                user_id: EntityUuid::parse(&user_uuid)?,
                responsibles: Vec::new(),
            };
            match QuestionnaireService::new(cfg).initialise(new) {
                Ok(service) => {
                    println!(
                        "Created questionnaire with UUID: {}",
                        service.questionnaire_id()
                    )
                }
                Err(e) => eprintln!("Error creating questionnaire: {}", e),
            }
        }
        Some(Commands::Show { questionnaire_uuid }) => {
            let store = QuestionStore::with_id(cfg, &questionnaire_uuid)?;
            let forest = store.organized()?;
            if forest.is_empty() {
                println!("No questions yet.");
            } else {
                print_forest(&forest, 0);
            }
        }
        Some(Commands::AddQuestion {
            questionnaire_uuid,
            text,
            question_type,
            parent,
            trigger,
        }) => {
            let store = QuestionStore::with_id(cfg, &questionnaire_uuid)?;
            let parent_question_id = match parent.as_deref() {
                Some(parent) => Some(EntityUuid::parse(parent)?),
                None => None,
            };
            let new = NewQuestion {
                questionnaire_id: store.questionnaire_id().clone(),
                parent_question_id,
                trigger_value: trigger,
                order_index: None,
                text: NonEmptyText::new(&text)?,
                question_type: question_type.parse()?,
                options: Vec::new(),
            };
            match store.create(new) {
                Ok(question) => println!("Added question with UUID: {}", question.id),
                Err(e) => eprintln!("Error adding question: {}", e),
            }
        }
        Some(Commands::RemoveQuestion {
            questionnaire_uuid,
            question_uuid,
        }) => {
            let store = QuestionStore::with_id(cfg, &questionnaire_uuid)?;
            let question_id = EntityUuid::parse(&question_uuid)?;
            match store.delete(&question_id) {
                Ok(()) => println!("Removed question with UUID: {}", question_id),
                Err(e) => eprintln!("Error removing question: {}", e),
            }
        }
        None => {
            println!("Use 'medforms --help' for commands");
        }
    }

    Ok(())
}

fn config_from_env() -> Result<Arc<CoreConfig>, Box<dyn std::error::Error>> {
    let form_data_dir = form_data_dir_from_env_value(std::env::var("FORM_DATA_DIR").ok());
    let namespace =
        std::env::var("MEDFORMS_NAMESPACE").unwrap_or_else(|_| "medforms.dev.1".into());
    Ok(Arc::new(CoreConfig::new(form_data_dir, namespace)?))
}

fn print_forest(nodes: &[QuestionTreeNode], depth: usize) {
    for node in nodes {
        let trigger = match node.question.trigger_value.as_deref() {
            Some(value) => format!(" (when parent = '{}')", value),
            None => String::new(),
        };
        println!(
            "{}{}. {} [{}]{}",
            "  ".repeat(depth),
            node.question.order_index,
            node.question.text,
            node.question.question_type,
            trigger
        );
        print_forest(&node.child_questions, depth + 1);
    }
}
