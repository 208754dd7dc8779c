use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use taskboard::auth::LoginRequest;
use taskboard::board::BoardStore;
use taskboard::models::{CommentDraft, TaskDraft, TaskPriority, TaskStatus};
use taskboard::session::FileStorage;
use taskboard::{ApiClient, ClientConfig, ClientError, CredentialStore, SessionEvent};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Work with a project's task board from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List projects
    Projects,
    /// Show a project's board
    Board {
        project_id: Uuid,
        /// Sprint to filter on (defaults to the active sprint)
        #[arg(long)]
        sprint: Option<Uuid>,
    },
    /// Create a task
    Create {
        project_id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "backlog")]
        status: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        points: Option<u32>,
        #[arg(long)]
        sprint: Option<Uuid>,
    },
    /// Move a task to another column
    Move {
        project_id: Uuid,
        task_id: Uuid,
        /// backlog, implementing, testing or deployed
        status: String,
        #[arg(long)]
        sprint: Option<Uuid>,
    },
    /// Delete a task
    Delete { task_id: Uuid },
    /// List a task's comments, or add one
    Comments {
        task_id: Uuid,
        #[arg(long)]
        add: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ClientError::SessionExpired) => {
            eprintln!("Your session has expired. Run `taskboard login` to sign in again.");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), ClientError> {
    let config = ClientConfig::from_env()?;
    let storage = Arc::new(FileStorage::new(config.session_file.clone()));
    let credentials = Arc::new(CredentialStore::open(storage)?);
    let api = Arc::new(ApiClient::new(config, credentials)?);

    let mut events = api.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::Refreshed => log::info!("Access token renewed"),
                SessionEvent::Expired => log::warn!("Session ended by the server"),
                _ => {}
            }
        }
    });

    match command {
        Command::Login { email, password } => {
            let user = api.login(&LoginRequest { email, password }).await?;
            println!("Logged in as {}", user.display_name());
        }
        Command::Logout => {
            api.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = api.current_user().await?;
            println!("{} <{}>", user.display_name(), user.email);
        }
        Command::Projects => {
            for project in api.list_projects().await? {
                println!("{}  {}", project.id, project.name);
            }
        }
        Command::Board { project_id, sprint } => {
            let board = BoardStore::new(api);
            match sprint {
                Some(sprint_id) => {
                    board.load(project_id, Some(sprint_id)).await?;
                }
                None => {
                    let opened = board.open_project(project_id).await?;
                    println!("# {}", opened.project.name);
                }
            }
            print_board(&board);
        }
        Command::Create {
            project_id,
            title,
            description,
            status,
            priority,
            points,
            sprint,
        } => {
            let draft = TaskDraft {
                title,
                description,
                status: status.parse()?,
                priority: parse_priority(&priority)?,
                story_points: points,
                project_id,
                sprint_id: sprint,
            };
            let task = api.create_task(&draft).await?;
            println!("Created {}  {}", task.id, task.title);
        }
        Command::Move {
            project_id,
            task_id,
            status,
            sprint,
        } => {
            let board = BoardStore::new(api);
            board.load(project_id, sprint).await?;
            let task = board.move_task(task_id, &status).await?;
            println!("{} is now in {}", task.title, task.status.label());
        }
        Command::Delete { task_id } => {
            api.delete_task(task_id).await?;
            println!("Deleted {}", task_id);
        }
        Command::Comments { task_id, add } => {
            if let Some(text) = add {
                api.create_comment(&CommentDraft { task_id, text }).await?;
            }
            for comment in api.list_comments(task_id).await? {
                let author = comment
                    .user
                    .as_ref()
                    .map(|user| user.display_name())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("{}: {}", author, comment.text);
            }
        }
    }
    Ok(())
}

fn parse_priority(raw: &str) -> Result<TaskPriority, ClientError> {
    match raw {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        other => Err(ClientError::Validation(format!("unknown priority {:?}", other))),
    }
}

fn print_board(board: &BoardStore) {
    for column in board.columns() {
        println!("\n{} ({})", column.status.label(), column.tasks.len());
        for task in column.tasks {
            let points = task
                .story_points
                .map(|p| format!(" {}pt", p))
                .unwrap_or_default();
            println!("  {}  {} [{:?}]{}", task.id, task.title, task.priority, points);
        }
    }
    if board.tasks_in_column(TaskStatus::Deployed).len() == board.tasks().len() && !board.tasks().is_empty() {
        println!("\nEverything is deployed.");
    }
}
