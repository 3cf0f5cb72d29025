use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use mingle_client::config::ClientConfig;
use mingle_client::flow::{FlowEvent, FlowMachine, FlowOutcome, FlowState, ProfileFields};
use mingle_client::identity::{HttpIdentityService, VerificationClient};
use mingle_client::session::{keys, MemorySessionStore, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = ClientConfig::default();
    if let Ok(url) = std::env::var("MINGLE_API_URL") {
        config.identity_base_url = url;
    }
    if let Ok(country) = std::env::var("MINGLE_COUNTRY") {
        config.default_country = country;
    }
    let country = config.default_country.clone();

    eprintln!("✨ Mingle v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Identity service: {}", config.identity_base_url);
    eprintln!("   (unreachable service falls back to a local simulation)");
    eprintln!("   Country: {country}\n");

    let primary = Arc::new(HttpIdentityService::new(
        &config.identity_base_url,
        config.request_timeout,
    )?);
    let client = VerificationClient::new(primary);
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let mut machine = FlowMachine::new(client, Arc::clone(&store), config);

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        print_prompt(&machine);
        let Some(line) = lines.next_line().await? else {
            machine.abandon();
            eprintln!("bye");
            return Ok(());
        };
        let line = line.trim();
        if line == "/quit" {
            machine.abandon();
            eprintln!("bye");
            return Ok(());
        }

        let Some(event) = parse_event(machine.state(), &country, line) else {
            eprintln!("  ?");
            continue;
        };
        machine.dispatch(event).await;

        if let Some(signal) = machine.error() {
            eprintln!("  ⚠️  {}", signal.message);
        }

        if machine.state().is_terminal() {
            if let Some(FlowOutcome::Completed {
                session,
                is_new_user,
                walkthrough_completed,
            }) = machine.handoff().await
            {
                // Host-side bookkeeping: the flags belong to the host, not
                // the machine.
                store
                    .set(keys::IS_NEW_USER, &serde_json::json!(is_new_user))
                    .await?;
                store
                    .set(
                        keys::WALKTHROUGH_COMPLETED,
                        &serde_json::json!(walkthrough_completed),
                    )
                    .await?;
                eprintln!(
                    "\n🎉 Signed in as @{} ({})",
                    session.user.username, session.user.name
                );
                return Ok(());
            }
        }
    }
}

fn print_prompt(machine: &FlowMachine) {
    let progress = machine.progress();
    if progress.visible {
        eprintln!(
            "\n[{} {}/{} — {}%]",
            progress.label, progress.step_number, progress.total_steps, progress.percentage
        );
    }
    let hint = match machine.state() {
        FlowState::Landing => "signin | signup",
        FlowState::PhoneEntry => "enter your phone number",
        FlowState::CodeVerification => "enter the 6-digit code",
        FlowState::ProfileCreation => "name,username[,email]",
        FlowState::InterestsStep => "toggle <interest> | done",
        FlowState::SocialsStep => "<platform> <handle> | remove <platform> | done | skip",
        FlowState::FriendsStep => "connect | skip",
        FlowState::Complete | FlowState::SignInSuccess => "…",
    };
    eprint!("({hint}) > ");
}

fn parse_event(state: FlowState, country: &str, line: &str) -> Option<FlowEvent> {
    match state {
        FlowState::Landing => match line {
            "signin" => Some(FlowEvent::ChooseSignIn),
            "signup" => Some(FlowEvent::ChooseSignUp),
            _ => None,
        },
        FlowState::PhoneEntry => Some(FlowEvent::SubmitPhone {
            country: country.to_string(),
            raw_input: line.to_string(),
        }),
        FlowState::CodeVerification => Some(FlowEvent::SubmitCode {
            code: line.to_string(),
        }),
        FlowState::ProfileCreation => {
            let mut parts = line.splitn(3, ',').map(str::trim);
            Some(FlowEvent::SubmitProfile(ProfileFields {
                name: parts.next().unwrap_or_default().to_string(),
                username: parts.next().unwrap_or_default().to_string(),
                email: parts.next().map(str::to_string),
                bio: None,
            }))
        }
        FlowState::InterestsStep => {
            if line == "done" {
                Some(FlowEvent::Continue)
            } else {
                let name = line.strip_prefix("toggle ").unwrap_or(line);
                Some(FlowEvent::ToggleInterest {
                    name: name.to_string(),
                })
            }
        }
        FlowState::SocialsStep => match line {
            "done" => Some(FlowEvent::Continue),
            "skip" => Some(FlowEvent::Skip),
            _ => {
                if let Some(platform) = line.strip_prefix("remove ") {
                    Some(FlowEvent::RemoveSocialHandle {
                        platform: platform.trim().to_string(),
                    })
                } else {
                    let (platform, handle) = line.split_once(' ')?;
                    Some(FlowEvent::SetSocialHandle {
                        platform: platform.to_string(),
                        handle: handle.trim().to_string(),
                    })
                }
            }
        },
        FlowState::FriendsStep => match line {
            "connect" => Some(FlowEvent::ConnectContacts),
            "skip" => Some(FlowEvent::Skip),
            _ => None,
        },
        FlowState::Complete | FlowState::SignInSuccess => None,
    }
}
