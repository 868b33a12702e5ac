//! Auth Service Administration CLI
//!
//! Drives the authentication service directly against the configured store,
//! without going through the HTTP API. Useful for seeding accounts and
//! inspecting tokens.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;

use auth_service::{
    config::AppConfig,
    database::open_store,
    models::{Credentials, PublicUserView},
    service::{AuthService, SystemClock},
};

/// Authentication service administration CLI
#[derive(Parser)]
#[command(name = "auth-admin", about = "Authentication service administration CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register(RegisterArgs),
    /// Log in and print an access token
    Login(LoginArgs),
    /// Resolve an access token to its user
    Whoami(WhoamiArgs),
    /// Show a user by id
    Show(ShowArgs),
}

#[derive(Args)]
struct RegisterArgs {
    /// Email address
    #[arg(short, long)]
    email: String,

    /// Username
    #[arg(short, long)]
    username: String,

    /// Password
    #[arg(short, long, env = "AUTH_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct LoginArgs {
    /// Email address
    #[arg(short, long)]
    email: String,

    /// Password
    #[arg(short, long, env = "AUTH_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct WhoamiArgs {
    /// Access token
    token: String,
}

#[derive(Args)]
struct ShowArgs {
    /// User ID
    id: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    config.validate()?;

    let store = open_store(config.database.as_ref()).await?;
    let service = AuthService::from_config(store, &config, Arc::new(SystemClock))?;

    match cli.command {
        Commands::Register(args) => register(&service, args).await?,
        Commands::Login(args) => login(&service, args).await?,
        Commands::Whoami(args) => whoami(&service, args).await?,
        Commands::Show(args) => show(&service, args).await?,
    }

    Ok(())
}

async fn register(
    service: &AuthService,
    args: RegisterArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = service
        .register(Credentials {
            email: args.email,
            username: args.username,
            password: args.password,
        })
        .await?;

    println!("User registered");
    print_user(&user);
    Ok(())
}

async fn login(service: &AuthService, args: LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let response = service.login(&args.email, &args.password).await?;

    println!("Login successful");
    print_user(&response.user);
    println!();
    println!("Access token (expires {}):", response.token.expires_at);
    println!("{}", response.token.access_token);
    Ok(())
}

async fn whoami(service: &AuthService, args: WhoamiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let user = service.authenticate(args.token.trim()).await?;
    print_user(&user);
    Ok(())
}

async fn show(service: &AuthService, args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let user = service.get_user(&args.id).await?;
    print_user(&user);
    Ok(())
}

fn print_user(user: &PublicUserView) {
    println!("   ID: {}", user.user_id);
    println!("   Email: {}", user.email);
    println!("   Username: {}", user.username);
    println!("   Active: {}", if user.is_active { "yes" } else { "no" });
    println!("   Verified: {}", if user.is_verified { "yes" } else { "no" });
    println!("   Created: {}", user.created_at.format("%Y-%m-%d %H:%M:%S"));
}
