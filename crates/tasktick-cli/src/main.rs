//! TaskTick CLI
//!
//! Thin wrapper around tasktick-core for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Create an account / sign in (stores the token under ~/.tasktick)
//! tasktick register ada@example.com hunter2 Ada Lovelace
//! tasktick login ada@example.com hunter2
//!
//! # List projects and their tasks
//! tasktick projects
//! tasktick tasks <project_id>
//!
//! # Create things
//! tasktick new-project "Apollo" --description "moonshot"
//! tasktick new-task <project_id> "Write the launch checklist"
//! tasktick note <project_id> <task_id> "Blocked on fuel delivery"
//!
//! # Follow live updates until Ctrl+C
//! tasktick watch
//!
//! # Forget the stored credentials
//! tasktick logout
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tasktick_core::{
    AuthClient, ClientConfig, ClientEvent, ConnectionState, Credentials, ProjectId, StoreEvent,
    TaskId, TasktickClient,
};

/// TaskTick - realtime task tracking
#[derive(Parser)]
#[command(name = "tasktick")]
#[command(version = "0.1.0")]
#[command(about = "TaskTick - realtime task tracking from the terminal")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Server base URL
    #[arg(short, long, global = true, default_value = "http://localhost:8080")]
    server: String,

    /// Data directory (default: ~/.tasktick)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the issued tokens
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },

    /// Create an account and store the issued tokens
    Register {
        /// Account email
        email: String,
        /// Account password
        password: String,
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
    },

    /// Forget the stored credentials
    Logout,

    /// List projects
    Projects,

    /// List tasks in a project
    Tasks {
        /// Project ID
        project_id: String,
    },

    /// Create a new project
    NewProject {
        /// Project name
        name: String,
        /// Project description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create a new task in a project
    NewTask {
        /// Project ID
        project_id: String,
        /// Task name
        name: String,
        /// Task description
        #[arg(long, default_value = "")]
        description: String,
        /// Board section the task starts in
        #[arg(long, default_value = "backlog")]
        section: String,
    },

    /// Attach a note to a task
    Note {
        /// Project ID
        project_id: String,
        /// Task ID
        task_id: String,
        /// Note text
        text: String,
    },

    /// Follow live updates until Ctrl+C
    Watch,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".tasktick"))
        .unwrap_or_else(|| PathBuf::from(".tasktick"))
}

fn credentials_path(data_dir: &PathBuf) -> PathBuf {
    data_dir.join("credentials.json")
}

/// Load stored credentials or explain how to get some
fn require_credentials(data_dir: &PathBuf) -> Result<Credentials> {
    match Credentials::load(credentials_path(data_dir))? {
        Some(credentials) => Ok(credentials),
        None => anyhow::bail!("Not logged in. Run `tasktick login <email> <password>` first."),
    }
}

/// Connect and wait for the socket to open
async fn connect_client(server: &str, credentials: &Credentials) -> Result<TasktickClient> {
    let config = ClientConfig::new(server, credentials.auth_token.clone());
    let client = TasktickClient::connect(config);

    let mut state = client.state();
    let opened = tokio::time::timeout(
        Duration::from_secs(10),
        state.wait_for(|s| *s == ConnectionState::Open),
    )
    .await;

    match opened {
        Ok(Ok(_)) => Ok(client),
        _ => anyhow::bail!("Could not reach {} (is the server running?)", server),
    }
}

/// Let the bootstrap replies land: wait for the first store change, then for
/// a quiet period
async fn await_bootstrap(client: &TasktickClient) {
    let mut events = client.stores().subscribe();
    if tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .is_err()
    {
        return;
    }
    while let Ok(Ok(_)) = tokio::time::timeout(Duration::from_millis(500), events.recv()).await {}
}

fn print_projects(client: &TasktickClient) {
    let projects = client.stores().projects();
    if projects.is_empty() {
        println!("No projects yet. Create one with `tasktick new-project <name>`.");
        return;
    }
    println!("Projects:");
    for project in projects {
        println!(
            "  {} - {} ({} tasks)",
            project.id.as_str(),
            project.name,
            project.tasks.len()
        );
        if !project.description.is_empty() {
            println!("      {}", project.description);
        }
    }
}

fn print_tasks(client: &TasktickClient, project_id: &ProjectId) {
    let tasks = client.stores().tasks_for(project_id);
    if tasks.is_empty() {
        println!("No tasks in this project yet.");
        return;
    }
    println!("Tasks:");
    for task in tasks {
        let mark = if task.done { "✓" } else { "○" };
        println!("  {} {} - {} [{}]", mark, task.id.as_str(), task.name, task.section);
        for note in &task.notes {
            println!("      note: {}", note.note);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    match cli.command {
        Commands::Login { email, password } => {
            let auth = AuthClient::new(cli.server.clone());
            let credentials = auth.login(&email, &password).await?;
            credentials.save(credentials_path(&data_dir))?;
            println!("Logged in as {}.", email);
        }

        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let auth = AuthClient::new(cli.server.clone());
            let credentials = auth
                .register(&email, &password, &first_name, &last_name)
                .await?;
            credentials.save(credentials_path(&data_dir))?;
            println!("Account created for {} {}.", first_name, last_name);
        }

        Commands::Logout => {
            if Credentials::delete(credentials_path(&data_dir))? {
                println!("Logged out.");
            } else {
                println!("No credentials found; already logged out.");
            }
        }

        Commands::Projects => {
            let credentials = require_credentials(&data_dir)?;
            let client = connect_client(&cli.server, &credentials).await?;
            await_bootstrap(&client).await;
            print_projects(&client);
            client.close();
        }

        Commands::Tasks { project_id } => {
            let credentials = require_credentials(&data_dir)?;
            let client = connect_client(&cli.server, &credentials).await?;
            await_bootstrap(&client).await;
            print_tasks(&client, &ProjectId::new(project_id));
            client.close();
        }

        Commands::NewProject { name, description } => {
            let credentials = require_credentials(&data_dir)?;
            let client = connect_client(&cli.server, &credentials).await?;
            client.send(ClientEvent::new_project(name.clone(), description))?;
            // Fire-and-forget protocol; give the frame a moment to flush
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("Project \"{}\" requested.", name);
            client.close();
        }

        Commands::NewTask {
            project_id,
            name,
            description,
            section,
        } => {
            let credentials = require_credentials(&data_dir)?;
            let client = connect_client(&cli.server, &credentials).await?;
            client.send(ClientEvent::NewTask {
                project: ProjectId::new(project_id),
                name: name.clone(),
                description,
                section,
            })?;
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("Task \"{}\" requested.", name);
            client.close();
        }

        Commands::Note {
            project_id,
            task_id,
            text,
        } => {
            let credentials = require_credentials(&data_dir)?;
            let client = connect_client(&cli.server, &credentials).await?;
            client.send(ClientEvent::NewNote {
                task: TaskId::new(task_id),
                project: ProjectId::new(project_id),
                note: text,
            })?;
            tokio::time::sleep(Duration::from_millis(300)).await;
            println!("Note attached.");
            client.close();
        }

        Commands::Watch => {
            let credentials = require_credentials(&data_dir)?;
            let client = connect_client(&cli.server, &credentials).await?;
            let mut events = client.stores().subscribe();

            println!("Watching for updates. Press Ctrl+C to stop.");
            println!();

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        println!();
                        println!("Stopping...");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(StoreEvent::ProjectUpserted { id }) => {
                            if let Some(project) = client.stores().project(&id) {
                                println!("project   {} - {}", id.as_str(), project.name);
                            }
                        }
                        Ok(StoreEvent::TaskUpserted { id }) => {
                            if let Some(task) = client.stores().task(&id) {
                                let mark = if task.done { "✓" } else { "○" };
                                println!("task      {} {} - {}", mark, id.as_str(), task.name);
                            }
                        }
                        Ok(StoreEvent::NoteUpserted { id }) => {
                            if let Some(note) = client.stores().note(&id) {
                                println!("note      {} - {}", id.as_str(), note.note);
                            }
                        }
                        Ok(StoreEvent::UserUpserted { id }) => {
                            if let Some(user) = client.stores().user(&id) {
                                println!("user      {} - {}", id.as_str(), user.display_name());
                            }
                        }
                        Ok(StoreEvent::Cleared) => println!("(replica cleared)"),
                        Err(_) => break,
                    },
                }
            }

            client.close();
        }
    }

    Ok(())
}
