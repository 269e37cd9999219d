//! User login demo
//!
//! Wires the pieces of roof together the way an application would:
//!
//! - **Definitions**: `user` and `profile` models are declared in `models/*.ron`
//!   and bound to Rust actions through an `ActionRegistry`
//! - **Global middleware**: configured from `config/pipeline.ron`, logs every
//!   action before it runs
//! - **Local middleware**: `user.login` rejects empty usernames
//! - **Relation**: a successful `user.login` loads the profile
//! - **Context**: mounts both models and re-renders a summary on every change
//!
//! Set `RUST_LOG=debug` to see pipeline and resolution events.

mod api;

use futures::executor::block_on;
use roof_core::{
    configure_global_middleware, global_middleware, Action, ActionEvent, Context, Error, Middleware,
    PipelineContext, Relation, Stage, Value, ValueMap,
};
use roof_script::{load_config_file, ActionRegistry, Loader};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn field(payload: &Value, key: &str) -> String {
    payload
        .as_map()
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn values<const N: usize>(entries: [(&str, Value); N]) -> ValueMap {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn registry() -> ActionRegistry {
    let guard = Middleware::new();
    guard.add(Stage::new(|ctx: &PipelineContext| {
        if ctx.action == "login" && field(&ctx.payload, "username").trim().is_empty() {
            return Err(Error::msg("username is required"));
        }
        Ok(ctx.payload.clone())
    }));

    let mut registry = ActionRegistry::new();
    registry
        .middleware("user", guard)
        .action(
            "user",
            "login",
            Action::from_async(|this, payload| async move {
                this.assign(values([
                    ("loading", Value::Bool(true)),
                    ("username", Value::from(field(&payload, "username"))),
                ]))?;
                let result = api::login(field(&payload, "username"), field(&payload, "password")).await;
                let success = result
                    .as_map()
                    .and_then(|map| map.get("success"))
                    .is_some_and(Value::is_truthy);
                this.assign(values([
                    ("loading", Value::Bool(false)),
                    ("isLogin", Value::Bool(success)),
                    ("userId", Value::from(field(&result, "id"))),
                    ("message", Value::from(field(&result, "message"))),
                ]))?;
                Ok(result)
            }),
        )
        .action(
            "user",
            "logout",
            Action::new(|this, _| {
                this.assign(values([
                    ("isLogin", Value::Bool(false)),
                    ("userId", Value::Null),
                ]))?;
                Ok(Value::Null)
            }),
        )
        .action(
            "profile",
            "load",
            Action::from_async(|this, id: Value| async move {
                let id = id.as_str().unwrap_or_default().to_string();
                let info = api::fetch_user_info(id.clone()).await.unwrap_or_default();
                this.set("info", info.clone())?;
                this.push("history", id)?;
                Ok(info)
            }),
        )
        .action(
            "profile",
            "clear",
            Action::new(|this, _| {
                this.set("info", ValueMap::new())?;
                Ok(Value::Null)
            }),
        );
    registry
}

fn relation() -> Relation {
    let relation = Relation::new();
    relation
        .listen_async("user.login", |event: ActionEvent| async move {
            let id = field(&event.result, "id");
            if id.is_empty() {
                return Ok(());
            }
            match event.context.get("profile") {
                Some(profile) => profile.dispatch("load", id).await.map(|_| ()),
                None => Ok(()),
            }
        })
        .listen_async("user.logout", |event: ActionEvent| async move {
            match event.context.get("profile") {
                Some(profile) => profile.dispatch("clear", Value::Null).await.map(|_| ()),
                None => Ok(()),
            }
        })
        .init(|context| {
            info!(models = ?context.keys().collect::<Vec<_>>(), "context mounted");
            Ok(())
        });
    relation
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = load_config_file(root.join("config/pipeline.ron"))?;
    configure_global_middleware(config);
    global_middleware().add(Stage::new(|ctx: &PipelineContext| {
        info!(action = %ctx.action, payload = %ctx.payload, "action");
        Ok(ctx.payload.clone())
    }));

    let mut loader = Loader::new();
    loader.load_directory(root.join("models"))?;
    let models = loader.resolve(&registry())?;

    let user_model = models.get("user").ok_or("user model not loaded")?;
    let profile_model = models.get("profile").ok_or("profile model not loaded")?;
    let context = Context::builder()
        .provide("user", user_model)
        .provide("profile", profile_model)
        .relation(relation())
        .mount()?;

    let _view = context.observe(&["user", "profile"], |models| {
        let user = &models["user"];
        let profile = &models["profile"];
        info!(
            username = %user.get("username").unwrap_or_default(),
            login = %user.get("isLogin").unwrap_or_default(),
            loading = %user.get("loading").unwrap_or_default(),
            profile = %profile.get("info").unwrap_or_default(),
            "render"
        );
    })?;

    let user = context.get("user").ok_or("user not mounted")?;
    block_on(async {
        if let Err(err) = user
            .dispatch("login", Value::map([("username", ""), ("password", "")]))
            .await
        {
            warn!(%err, "login rejected");
        }

        let result = user
            .dispatch("login", Value::map([("username", "jack"), ("password", "000")]))
            .await?;
        info!(%result, "first attempt");

        let result = user
            .dispatch("login", Value::map([("username", "jack"), ("password", "123")]))
            .await?;
        info!(%result, "second attempt");

        user.dispatch("logout", Value::Null).await?;
        Ok::<_, Error>(())
    })?;

    info!(history = %context.get("profile").ok_or("profile not mounted")?.get("history")?, "done");
    Ok(())
}
