//! breakwater CLI - Command line interface for the sandbox

use breakwater_core::config::default_socket_path;
use breakwater_core::protocol::{ExecuteRequest, Request, Response};
use breakwater_core::{ExecutionResult, Sandbox, SandboxConfig};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Exit code reported when the snippet exceeded its wall-clock budget.
const TIMEOUT_EXIT_CODE: i32 = 124;

#[derive(Parser)]
#[command(name = "breakwater")]
#[command(author, version, about = "Resource-bounded sandbox for untrusted Python snippets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a snippet via the daemon
    Exec {
        /// Code to execute (or - for stdin)
        code: String,

        /// Socket path (defaults to BREAKWATER_SOCKET env var or /run/breakwater/breakwater.sock)
        #[arg(short, long)]
        socket: Option<PathBuf>,

        /// Timeout in seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get daemon execution counters
    Status {
        /// Socket path (defaults to BREAKWATER_SOCKET env var or /run/breakwater/breakwater.sock)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// Ping the daemon
    Ping {
        /// Socket path (defaults to BREAKWATER_SOCKET env var or /run/breakwater/breakwater.sock)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// Run a snippet directly (without daemon, for testing)
    Run {
        /// Code to execute (or - for stdin)
        code: String,

        /// Timeout in seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,

        /// Address-space limit in MB
        #[arg(short, long, default_value = "512")]
        memory: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

mod client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("breakwater=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Exec {
            code,
            socket,
            timeout,
            json,
        } => {
            let socket = socket.unwrap_or_else(default_socket_path);
            let code = read_code(&code)?;
            let request = Request::Execute(ExecuteRequest {
                code,
                timeout_secs: Some(timeout),
            });

            match client::call(&socket, &request).await? {
                Response::Execute(response) => {
                    if let Some(result) = response.result {
                        let exit = print_result(&result, json);
                        std::process::exit(exit);
                    }
                    let message = response.error.unwrap_or_else(|| "unknown error".into());
                    eprintln!("execution failed: {message}");
                    std::process::exit(1);
                }
                other => {
                    eprintln!("unexpected response: {other:?}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Status { socket } => {
            let socket = socket.unwrap_or_else(default_socket_path);
            match client::call(&socket, &Request::Status).await? {
                Response::Status {
                    started,
                    completed,
                    timed_out,
                } => {
                    println!("started:   {started}");
                    println!("completed: {completed}");
                    println!("timed out: {timed_out}");
                }
                other => {
                    eprintln!("unexpected response: {other:?}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Ping { socket } => {
            let socket = socket.unwrap_or_else(default_socket_path);
            match client::call(&socket, &Request::Ping).await? {
                Response::Pong => println!("pong"),
                other => {
                    eprintln!("unexpected response: {other:?}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Run {
            code,
            timeout,
            memory,
            json,
        } => {
            let code = read_code(&code)?;
            let config = SandboxConfig::builder()
                .max_address_space_mb(memory)
                .default_timeout_secs(timeout)
                .build();
            let sandbox = Sandbox::new(config);

            let result = sandbox
                .execute(&code, Some(Duration::from_secs(timeout)))
                .await?;
            let exit = print_result(&result, json);
            std::process::exit(exit);
        }
    }

    Ok(())
}

/// Read the snippet from the argument, or from stdin when it is `-`.
fn read_code(arg: &str) -> Result<String, std::io::Error> {
    if arg == "-" {
        let mut code = String::new();
        std::io::stdin().read_to_string(&mut code)?;
        Ok(code)
    } else {
        Ok(arg.to_owned())
    }
}

/// Print an execution result and return the exit code to report.
fn print_result(result: &ExecutionResult, json: bool) -> i32 {
    if json {
        let rendered = serde_json::json!({
            "stdout": result.stdout_str(),
            "stderr": result.stderr_str(),
            "exit_code": result.exit_code,
            "timed_out": result.timed_out,
            "truncated": result.truncated,
            "duration_ms": result.duration.as_millis(),
        });
        println!("{rendered:#}");
    } else {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(&result.stdout);
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(&result.stderr);
        if result.timed_out {
            eprintln!("breakwater: execution timed out");
        }
    }

    if result.timed_out {
        TIMEOUT_EXIT_CODE
    } else {
        result.exit_code
    }
}
