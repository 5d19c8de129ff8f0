//! `zkhctl`: the service desk API from the command line.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zkhctl::api::models::{
    RequestStatus, RequestType, RequestUpdate, UserRole, UserStatus, UserUpdate, UserUpdateAdmin,
};
use zkhctl::api::{QueryParams, RequestFilter, UserFilter};
use zkhctl::auth::{decode_claims, KeyringStore, MemoryStore, Session};
use zkhctl::{ApiClient, Config, Reply};

#[derive(Parser, Debug)]
#[command(name = "zkhctl")]
#[command(about = "Command-line client for the housing service desk API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the configured backend and the stored credential.
    Status,
    /// Check that the backend is up.
    Health,
    /// Create a new client account.
    Register {
        /// Phone number, 11 digits.
        #[arg(long)]
        username: String,
        #[arg(long)]
        fullname: String,
        #[arg(long)]
        address: Option<String>,
        /// Prompted for if omitted.
        #[arg(long, env = "ZKH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log in and store the access token.
    Login {
        #[arg(long)]
        username: String,
        /// Prompted for if omitted.
        #[arg(long, env = "ZKH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored access token.
    Logout,
    /// Show the logged-in user.
    Me,
    /// List users.
    Users {
        #[arg(long)]
        role: Option<UserRole>,
        #[arg(long)]
        status: Option<UserStatus>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one user.
    User { id: i64 },
    /// Update your own (or, for managers, anyone's) profile.
    UpdateUser {
        id: i64,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Update a user, including role and status.
    AdminUpdateUser {
        id: i64,
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        role: Option<UserRole>,
        #[arg(long)]
        status: Option<UserStatus>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a user.
    DeleteUser { id: i64 },
    /// List service requests.
    Requests {
        #[arg(long)]
        status: Option<RequestStatus>,
        #[arg(long = "type")]
        kind: Option<RequestType>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one service request.
    Request { id: i64 },
    /// File a new service request.
    CreateRequest {
        /// plumbing, electricity, elevator, cleaning, heating or other.
        kind: RequestType,
        description: String,
    },
    /// Change a service request.
    UpdateRequest {
        id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<RequestStatus>,
        /// 1 = normal, 2 = high, 3 = urgent.
        #[arg(long)]
        priority: Option<u8>,
    },
    /// Assign an executor to a service request.
    Assign { request_id: i64, executor_id: i64 },
    /// Delete a service request.
    DeleteRequest { id: i64 },
    /// List the comments on a service request.
    Comments { id: i64 },
    /// Comment on a service request.
    Comment { request_id: i64, text: String },
    /// Show dashboard statistics.
    Stats,
    /// List system settings.
    Settings,
    /// Change a system setting.
    SetSetting { key: String, value: String },
}

#[derive(clap::Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    fullname: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    password: Option<String>,
}

impl From<ProfileArgs> for UserUpdate {
    fn from(args: ProfileArgs) -> Self {
        UserUpdate {
            fullname: args.fullname,
            address: args.address,
            password: args.password,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("zkhctl=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = Config::load()?;
    config.validate().map_err(anyhow::Error::msg)?;

    let session = if config.ephemeral {
        Session::new(MemoryStore::new())
    } else {
        Session::new(KeyringStore::new(&config.keyring_service)?)
    };
    let client = ApiClient::from_config(&config, Arc::new(session))?;

    match args.command {
        Command::Status => cmd_status(&client),
        Command::Health => render(client.service_info().await?),
        Command::Register {
            username,
            fullname,
            address,
            password,
        } => {
            let password = password_or_prompt(password)?;
            render(
                client
                    .register(&username, &password, &fullname, address.as_deref())
                    .await?,
            )
        }
        Command::Login { username, password } => {
            let password = password_or_prompt(password)?;
            let reply = client.login(&username, &password).await?;
            // The token goes to the keyring, not the terminal.
            render(reply.map(|token| token.token_type))
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Me => render(client.get_current_user().await?),
        Command::Users {
            role,
            status,
            search,
            skip,
            limit,
        } => {
            let filter = UserFilter {
                skip,
                limit,
                role,
                status,
                search,
            };
            render(client.get_users(&QueryParams::from(&filter)).await?)
        }
        Command::User { id } => render(client.get_user(id).await?),
        Command::UpdateUser { id, profile } => {
            render(client.update_user(id, &profile.into()).await?)
        }
        Command::AdminUpdateUser {
            id,
            profile,
            role,
            status,
            active,
        } => {
            let update = UserUpdateAdmin {
                profile: profile.into(),
                role,
                status,
                is_active: active,
            };
            render(client.update_user_admin(id, &update).await?)
        }
        Command::DeleteUser { id } => render(client.delete_user(id).await?),
        Command::Requests {
            status,
            kind,
            skip,
            limit,
        } => {
            let filter = RequestFilter {
                skip,
                limit,
                status_filter: status,
                type_filter: kind,
            };
            render(client.get_requests(&QueryParams::from(&filter)).await?)
        }
        Command::Request { id } => render(client.get_request(id).await?),
        Command::CreateRequest { kind, description } => {
            render(client.create_request(kind, &description).await?)
        }
        Command::UpdateRequest {
            id,
            description,
            status,
            priority,
        } => {
            let update = RequestUpdate {
                description,
                status,
                priority,
            };
            render(client.update_request(id, &update).await?)
        }
        Command::Assign {
            request_id,
            executor_id,
        } => render(client.assign_executor(request_id, executor_id).await?),
        Command::DeleteRequest { id } => render(client.delete_request(id).await?),
        Command::Comments { id } => render(client.get_request_comments(id).await?),
        Command::Comment { request_id, text } => {
            render(client.create_comment(request_id, &text).await?)
        }
        Command::Stats => render(client.get_dashboard_stats().await?),
        Command::Settings => render(client.get_settings().await?),
        Command::SetSetting { key, value } => render(client.update_setting(&key, &value).await?),
    }
}

/// Prints a reply. A sign-out is reported on stderr and fails the command.
fn render<T: Serialize>(reply: Reply<T>) -> anyhow::Result<ExitCode> {
    match reply {
        Reply::Data(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(ExitCode::SUCCESS)
        }
        Reply::NoContent => {
            println!("Done.");
            Ok(ExitCode::SUCCESS)
        }
        Reply::SignedOut(event) => {
            eprintln!(
                "Session expired or credentials rejected; log in again (see {}).",
                event.redirect_to
            );
            Ok(ExitCode::from(2))
        }
    }
}

fn cmd_status(client: &ApiClient) -> anyhow::Result<ExitCode> {
    println!("Backend: {}", client.base_url());

    let Some(token) = client.session().credential()? else {
        println!("Not logged in.");
        return Ok(ExitCode::SUCCESS);
    };

    // The server has the final word; this is only what the token claims.
    match decode_claims(&token) {
        Ok(claims) => {
            println!("Logged in as: {}", claims.sub);
            if let Some(role) = &claims.role {
                println!("Role: {role}");
            }
            if let Some(expires_at) = claims.expires_at() {
                let note = if claims.is_expired() { " (expired)" } else { "" };
                println!("Token expires: {expires_at}{note}");
            }
        }
        Err(err) => println!("Holding a token, but can't read it: {err}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn password_or_prompt(password: Option<String>) -> io::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => interactive_prompt("your password"),
    }
}

/// Quick and dirty function to read input from the user.
fn interactive_prompt(prompt_type: &str) -> io::Result<String> {
    let mut response = String::new();
    print!("Please enter {prompt_type}: ");
    io::stdout().flush()?;
    io::stdin().read_line(&mut response)?;

    // Remove newline
    Ok(response.trim_end_matches(['\r', '\n']).to_string())
}
