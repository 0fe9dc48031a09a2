use std::env;
use std::path::PathBuf;

use cem_lsp::server::Backend;
use tower_lsp_server::{LspService, Server};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("cem-lsp {VERSION} - Language Server for Custom Elements Manifests");
    eprintln!();
    eprintln!("Usage: cem-lsp [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --workspace-root <path>   Workspace root (default: current directory)");
    eprintln!("  --manifest <path>         Extra manifest path to load (repeatable)");
    eprintln!("  --stdio                   Use stdio transport (default)");
    eprintln!("  --version                 Print version information");
    eprintln!("  --help                    Print this help message");
}

struct Args {
    workspace_root: PathBuf,
    manifests: Vec<PathBuf>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut workspace_root = env::current_dir().unwrap_or_default();
    let mut manifests = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("cem-lsp {VERSION}");
                return None;
            }
            "--help" | "-h" => {
                print_help();
                return None;
            }
            "--stdio" => {}
            "--workspace-root" => {
                let Some(path) = iter.next() else {
                    eprintln!("--workspace-root requires a path argument");
                    std::process::exit(1);
                };
                workspace_root = PathBuf::from(path);
            }
            "--manifest" => {
                let Some(path) = iter.next() else {
                    eprintln!("--manifest requires a path argument");
                    std::process::exit(1);
                };
                manifests.push(PathBuf::from(path));
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {arg}");
                eprintln!("Run 'cem-lsp --help' for usage information.");
                std::process::exit(1);
            }
            _ => {}
        }
    }

    Some(Args {
        workspace_root,
        manifests,
    })
}

#[tokio::main]
async fn main() {
    let raw_args: Vec<String> = env::args().skip(1).collect();
    let Some(args) = parse_args(&raw_args) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("starting cem-lsp v{VERSION}");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| {
        Backend::with_workspace_root_and_manifests(client, args.workspace_root.clone(), args.manifests.clone())
    });

    Server::new(stdin, stdout, socket).serve(service).await;
}
