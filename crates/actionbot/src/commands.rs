//! Command handlers.

use std::io::Write;
use std::sync::Arc;

use actionbot_core::reply::SEND_SUCCEEDED;
use actionbot_core::{
    ApiClient, AuthEscalation, Category, Error, InboxOptions, InboxSession, KeyringSessionStore,
    MemorySessionStore, MessageId, PipelineEvent, SessionBackend, SessionStore, Settings,
    TriageBackend, UserId,
};
use anyhow::{Context as _, anyhow};
use chrono::Local;
use tracing::{info, warn};
use url::Url;

use crate::display;

/// Everything a command needs.
pub struct Context {
    settings: Settings,
    client: Arc<ApiClient>,
    escalation: AuthEscalation,
}

impl Context {
    /// Load settings and build the backend client and session store.
    pub async fn load(backend_url: Option<String>) -> anyhow::Result<Self> {
        let mut settings = Settings::load().await.context("Failed to load settings")?;
        if let Some(url) = backend_url {
            settings.backend_url = url;
        }

        let client = ApiClient::with_timeout(&settings.backend_url, settings.request_timeout())
            .with_context(|| format!("Invalid backend URL {:?}", settings.backend_url))?;

        let store: Arc<dyn SessionStore> = match settings.session_backend {
            SessionBackend::Keyring => Arc::new(KeyringSessionStore::new()),
            SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        };

        Ok(Self {
            settings,
            client: Arc::new(client),
            escalation: AuthEscalation::new(store),
        })
    }

    fn open_inbox(&self) -> anyhow::Result<InboxSession> {
        let backend: Arc<dyn TriageBackend> = self.client.clone();
        match InboxSession::open(
            backend,
            self.escalation.clone(),
            InboxOptions::from(&self.settings),
        ) {
            Ok(inbox) => Ok(inbox),
            Err(Error::NotLoggedIn) => Err(anyhow!("Not logged in, run `actionbot login` first")),
            Err(e) => Err(e.into()),
        }
    }
}

/// Turn a core error into what the user sees: the generic notice when one
/// was set, the error itself otherwise.
fn user_facing(err: Error, notice: Option<String>) -> anyhow::Error {
    match (err, notice) {
        (Error::AccessRevoked, _) => Error::AccessRevoked.into(),
        (_, Some(notice)) => anyhow!(notice),
        (err, None) => err.into(),
    }
}

/// List the inbox, without classifying it, and open one message.
async fn open_message(inbox: &mut InboxSession, message_id: &str) -> anyhow::Result<()> {
    if let Err(e) = inbox.refresh_listing().await {
        let notice = inbox.notice().map(ToString::to_string);
        return Err(user_facing(e, notice));
    }
    if let Err(e) = inbox.select_message(&MessageId::from(message_id)).await {
        let notice = inbox.notice().map(ToString::to_string);
        return Err(user_facing(e, notice));
    }
    Ok(())
}

fn reply_notice(inbox: &mut InboxSession) -> Option<String> {
    inbox
        .reply_mut()
        .ok()
        .and_then(|reply| reply.notice().map(ToString::to_string))
}

/// `actionbot login`
pub async fn login(ctx: &Context) -> anyhow::Result<()> {
    let url = ctx.client.login_url().await?;

    println!("Log in with Google at:\n\n  {url}\n");
    if let Err(e) = opener::open(url.as_str()) {
        warn!("Could not open a browser: {e}");
    }
    println!("Then run `actionbot callback <redirect-url>` with the address you land on.");
    Ok(())
}

/// `actionbot callback <user-id>`
pub fn callback(ctx: &Context, raw: &str) -> anyhow::Result<()> {
    let user_id = extract_user_id(raw).ok_or_else(|| anyhow!("No user id found in {raw:?}"))?;
    ctx.escalation.session().set_user_id(&user_id)?;

    info!("Logged in as {user_id}");
    println!("Logged in.");
    Ok(())
}

/// Accepts a bare user id or the redirect URL carrying `userId`.
fn extract_user_id(raw: &str) -> Option<UserId> {
    let raw = raw.trim();
    if let Ok(url) = Url::parse(raw) {
        return url
            .query_pairs()
            .find(|(key, _)| key == "userId")
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(UserId::from);
    }

    (!raw.is_empty()).then(|| UserId::from(raw))
}

/// `actionbot logout`
pub fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.escalation.logout()?;
    println!("Logged out.");
    Ok(())
}

/// `actionbot whoami`
pub async fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let inbox = ctx.open_inbox()?;
    let profile = inbox.profile().await?;

    match (profile.name, profile.email) {
        (Some(name), Some(email)) => println!("{name} <{email}>"),
        (None, Some(email)) => println!("{email}"),
        (Some(name), None) => println!("{name}"),
        (None, None) => println!("{}", inbox.user()),
    }
    Ok(())
}

/// `actionbot inbox [--category <c>]`
pub async fn inbox(ctx: &Context, category: Option<&str>) -> anyhow::Result<()> {
    let mut inbox = ctx.open_inbox()?;

    let mut stderr = std::io::stderr();
    let loaded = inbox
        .load_with(|event| {
            if let PipelineEvent::Progress {
                completed, total, ..
            } = event
            {
                let _ = write!(stderr, "\r{}", display::progress_line(*completed, *total));
                let _ = stderr.flush();
            }
        })
        .await;
    eprintln!();
    if let Err(e) = loaded {
        let notice = inbox.notice().map(ToString::to_string);
        return Err(user_facing(e, notice));
    }

    let summary = inbox.summary();
    if !summary.is_empty() {
        println!("Categories:");
        for count in &summary {
            println!(
                "  {:<18} {:>4}  {}",
                count.category.label(),
                count.count,
                count.category.description()
            );
        }
        println!();
    }

    if let Some(raw) = category {
        let category = Category::parse(raw);
        if let Err(e) = inbox.select_category(category).await {
            let notice = inbox.notice().map(ToString::to_string);
            return Err(user_facing(e, notice));
        }
        println!("Showing {category}:");
    }

    let now = Local::now();
    let selected = inbox.selected().map(|s| s.summary.id.clone());
    let visible = inbox.visible_messages();
    if visible.is_empty() {
        println!("No messages.");
    }
    for message in visible {
        let marker = if selected.as_ref() == Some(&message.id) {
            '>'
        } else {
            ' '
        };
        let label = inbox
            .index()
            .get(&message.id)
            .map_or("-", |category| category.label());
        println!(
            "{marker} {:<18} {:>10}  {:<24}  {:<40}  {label}",
            message.id.as_str(),
            display::format_relative(&message.date, now),
            display::truncate(&display::sender_name(&message.from), 24),
            display::truncate(&message.subject, 40),
        );
    }
    Ok(())
}

/// `actionbot show <id>`
pub async fn show(ctx: &Context, message_id: &str) -> anyhow::Result<()> {
    let mut inbox = ctx.open_inbox()?;
    open_message(&mut inbox, message_id).await?;

    let selected = inbox
        .selected()
        .ok_or_else(|| anyhow!("Message {message_id} could not be opened"))?;
    let summary = &selected.detail.summary;

    println!("From:    {}", summary.from);
    println!(
        "Date:    {}",
        display::format_relative(&summary.date, Local::now())
    );
    println!("Subject: {}", summary.subject);
    if let Some(classification) = &selected.detail.classification {
        println!(
            "Category: {} ({})",
            classification.category,
            classification.category.description()
        );
        if let Some(action) = &classification.action {
            println!("Action:   {action}");
        }
        if let Some(justification) = &classification.justification {
            println!("Why:      {justification}");
        }
    }
    println!();
    println!(
        "{}",
        selected
            .detail
            .body
            .as_deref()
            .unwrap_or(&selected.detail.summary.snippet)
    );
    Ok(())
}

/// `actionbot reply <id> [--text <t>] [--send]`
pub async fn reply(
    ctx: &Context,
    message_id: &str,
    text: Option<String>,
    send: bool,
) -> anyhow::Result<()> {
    let mut inbox = ctx.open_inbox()?;
    open_message(&mut inbox, message_id).await?;

    if let Err(e) = inbox.generate_reply().await {
        let notice = reply_notice(&mut inbox);
        return Err(user_facing(e, notice));
    }
    if let Some(text) = text {
        inbox.reply_mut()?.edit_draft(text)?;
    }

    if let Some(draft) = inbox.reply_mut()?.draft() {
        if !draft.subject_echo.is_empty() {
            println!("Subject: {}", draft.subject_echo);
        }
        println!("{}\n", draft.text);
    }

    if !send {
        println!("Not sent. Run again with --send to send it.");
        return Ok(());
    }

    match inbox.send_reply().await {
        Ok(_) => {
            println!("{SEND_SUCCEEDED}");
            Ok(())
        }
        Err(Error::Reply(e)) => {
            let notice = reply_notice(&mut inbox);
            Err(user_facing(Error::Reply(e), notice))
        }
        Err(Error::AccessRevoked) => Err(Error::AccessRevoked.into()),
        Err(e) => Err(e).context("Reply was sent but the inbox could not be refreshed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_user_id_from_redirect() {
        let id = extract_user_id("http://localhost:4200/inbox?userId=abc-123&x=1");
        assert_eq!(id, Some(UserId::from("abc-123")));
    }

    #[test]
    fn test_extract_bare_user_id() {
        assert_eq!(extract_user_id("  abc-123 "), Some(UserId::from("abc-123")));
        assert_eq!(extract_user_id("   "), None);
        assert_eq!(extract_user_id("http://localhost:4200/inbox"), None);
    }

    #[test]
    fn test_user_facing_prefers_notice() {
        let err = user_facing(Error::NoSelection, Some("Failed to load emails.".into()));
        assert_eq!(err.to_string(), "Failed to load emails.");

        let err = user_facing(Error::AccessRevoked, Some("ignored".into()));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::AccessRevoked)
        ));
    }
}
