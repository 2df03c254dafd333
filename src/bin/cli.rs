use clap::{Parser, Subcommand};
use omcp::{
    client::{OmcpClient, DEFAULT_HOST},
    models::InstanceSnapshot,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "omcp-cli")]
#[command(about = "CLI tool for managing OMCP servers", long_about = None)]
struct Cli {
    /// Base URL of the OMCP daemon
    #[arg(long, global = true, env = "OMCP_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Server management commands
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },

    /// Tool inspection commands
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },

    /// Upload a plugin artifact
    Load {
        /// Path to the plugin file
        file: PathBuf,

        /// Server the plugin is meant for (repeatable)
        #[arg(short, long = "server")]
        servers: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ServerCommands {
    /// Create a new server
    Create {
        /// Server name
        #[arg(short, long)]
        name: String,

        /// Server description
        #[arg(short, long, default_value = "")]
        desc: String,

        /// Server version
        #[arg(short, long, default_value = "0.0.1")]
        version: String,
    },

    /// Delete a server
    Delete {
        #[arg(short, long)]
        name: String,
    },

    /// List servers
    List {
        /// Only show running servers
        #[arg(long)]
        alive: bool,
    },

    /// Start a server
    Start {
        #[arg(short, long)]
        name: String,
    },

    /// Stop a server
    Stop {
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum ToolCommands {
    /// List the tools registered on a server
    List {
        #[arg(short, long)]
        server: String,
    },
}

fn print_servers(servers: &[InstanceSnapshot]) {
    if servers.is_empty() {
        println!("No servers found.");
        return;
    }

    println!(
        "{:<20} {:<30} {:<10} {:<8} {:<20} {:<20}",
        "Name", "Description", "Version", "Status", "Created_At", "Updated_At"
    );
    println!("{}", "-".repeat(113));
    for server in servers {
        println!(
            "{:<20} {:<30} {:<10} {:<8} {:<20} {:<20}",
            server.name,
            server.desc,
            server.version,
            server.state.as_str(),
            server.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            server.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
    }
}

fn fail(action: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("❌ Failed to {}: {}", action, err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();
    let client = OmcpClient::new(cli.host);

    if client.ready().await.is_err() {
        eprintln!("OMCP server is not ready, please start the server first");
        std::process::exit(1);
    }

    match cli.command {
        Commands::Server { command } => match command {
            ServerCommands::Create {
                name,
                desc,
                version,
            } => match client.create_server(&name, &desc, &version).await {
                Ok(_) => println!("✅ Server '{}' created successfully!", name),
                Err(err) => fail("create server", err),
            },

            ServerCommands::Delete { name } => match client.delete_server(&name).await {
                Ok(()) => println!("✅ Server '{}' deleted successfully!", name),
                Err(err) => fail("delete server", err),
            },

            ServerCommands::List { alive } => match client.list_servers(alive).await {
                Ok(servers) => print_servers(&servers),
                Err(err) => fail("list servers", err),
            },

            ServerCommands::Start { name } => match client.start_server(&name).await {
                Ok(()) => println!("✅ Server '{}' started", name),
                Err(err) => fail("start server", err),
            },

            ServerCommands::Stop { name } => match client.stop_server(&name).await {
                Ok(()) => println!("✅ Server '{}' stopped", name),
                Err(err) => fail("stop server", err),
            },
        },

        Commands::Tool { command } => match command {
            ToolCommands::List { server } => match client.list_tools(&server).await {
                Ok(tools) if tools.is_empty() => println!("No tools found."),
                Ok(tools) => {
                    println!("{:<30} {:<50}", "Name", "Description");
                    println!("{}", "-".repeat(81));
                    for tool in tools {
                        println!("{:<30} {:<50}", tool.name, tool.desc);
                    }
                }
                Err(err) => fail("list tools", err),
            },
        },

        Commands::Load { file, servers } => match client.load_plugin(&file, &servers).await {
            Ok(receipt) => {
                println!("✅ Plugin uploaded successfully!");
                println!("  File: {}", receipt.file_name.as_deref().unwrap_or("N/A"));
                println!("  SHA-256: {}", receipt.sha256.as_deref().unwrap_or("N/A"));
                if let Some(size) = receipt.size {
                    println!("  Size: {} bytes", size);
                }
            }
            Err(err) => fail("upload plugin", err),
        },
    }

    Ok(())
}
