use clap::{Parser, Subcommand};
use flowdoc::remote::{FileStore, HttpFileStore, Provider, SessionClient};
use flowdoc::{ClientConfig, Document, ProjectSession};
use std::error::Error;
use std::sync::Arc;

/// Command-line access to flow projects stored on the backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend address (overrides FLOWDOC_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List projects
    List,
    /// Print a project's nodes and edges
    Show {
        /// Project name
        name: String,
    },
    /// Create an empty project
    Create {
        /// Project name
        name: String,
    },
    /// Delete a project
    Delete {
        /// Project name
        name: String,
    },
    /// Write the seeded start/end document into an empty project
    Seed {
        /// Project name
        name: String,
    },
    /// Show the current session user
    Whoami,
    /// Print the address to sign in with a provider
    LoginUrl {
        /// OAuth provider
        #[arg(value_enum)]
        provider: Provider,
    },
    /// End the current session
    Logout,
}

fn print_document(name: &str, document: &Document) {
    println!("{name}: {} nodes, {} edges", document.nodes.len(), document.edges.len());
    for node in &document.nodes {
        println!(
            "  [{}] {} ({}) \"{}\" at ({:.0}, {:.0})",
            node.kind,
            node.id,
            node.data.job(),
            node.data.name,
            node.position.x,
            node.position.y
        );
    }
    for edge in &document.edges {
        let handle = edge.source_handle().unwrap_or("default");
        println!("  {} -> {} via {handle} [{}]", edge.source, edge.target, edge.id);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Set up logging; RUST_LOG controls verbosity
    env_logger::init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }

    let files = Arc::new(HttpFileStore::new(&config)?);
    let session_client = files.session_client();

    match cli.command {
        Command::Whoami => {
            let user = session_client.user_info().await?;
            println!("{} ({}) id={}", user.user_name, user.user_type, user.user_id);
            return Ok(());
        }
        Command::LoginUrl { provider } => {
            println!("{}", session_client.login_url(provider));
            return Ok(());
        }
        Command::Logout => {
            session_client.logout().await?;
            println!("Logged out");
            return Ok(());
        }
        _ => {}
    }

    let user = session_client.user_info().await?;
    let store: Arc<dyn FileStore> = files;
    let mut projects = ProjectSession::new(store, Some(user));

    match cli.command {
        Command::List => {
            for entry in projects.list().await? {
                let last_edit = entry
                    .last_edit
                    .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("{:<30} {last_edit}", entry.name);
            }
        }
        Command::Show { name } => {
            let project = projects.open(&name).await?;
            if let Some(notice) = project.notice() {
                println!("{notice}");
            }
            print_document(&name, project.editor.document());
        }
        Command::Create { name } => {
            let stored = projects.create(&name).await?;
            println!("Created {stored}");
        }
        Command::Delete { name } => {
            projects.delete(&name).await?;
            println!("Deleted {name}");
        }
        Command::Seed { name } => {
            let project = projects.open(&name).await?;
            if !project.seeded {
                println!("{name} already has content; leaving it untouched");
                return Ok(());
            }
            let report = projects.save().await?;
            println!("{}", report.message());
            report.result?;
        }
        Command::Whoami | Command::LoginUrl { .. } | Command::Logout => {}
    }

    Ok(())
}
