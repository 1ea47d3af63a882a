mod app;
mod properties;
mod settings;
mod template;

use anyhow::Context as _;
use editor::{Editor, GraphSource as _, JsonFileSink};
use gpui::*;
use gpui_component::Root;
use gpui_component_assets::Assets;
use graphview::{CancelGesture, DeleteSelected, KEY_CONTEXT};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::BuilderApp;
use crate::settings::Settings;

const DEFAULT_LOG_FILTER: &str = "agent_builder=info,editor=info,graphview=info";

/// Installs the log subscriber. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("failed to create log filter")?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

/// Builds the editor, restoring the last saved graph when there is one.
fn load_editor(settings: &Settings, sink: &JsonFileSink) -> Editor {
    let mut editor = Editor::new(settings.editor.clone());
    let saved = sink
        .load()
        .with_context(|| format!("failed to load {}", sink.path().display()));
    match saved {
        Ok(Some(snapshot)) => {
            for err in editor.load(snapshot) {
                warn!(%err, "saved entry skipped");
            }
            info!(path = %sink.path().display(), nodes = editor.graph().nodes().len(), "graph restored");
        }
        Ok(None) => {}
        // A damaged save file should not keep the builder from starting.
        Err(err) => warn!("{err:#}"),
    }
    editor
}

fn open_main_window(settings: Settings, cx: &mut App) -> anyhow::Result<()> {
    let sink = JsonFileSink::new(settings.save_path.clone());
    let editor = load_editor(&settings, &sink);

    let bounds = Bounds::centered(None, size(px(1280.0), px(800.0)), cx);
    let options = WindowOptions {
        window_bounds: Some(WindowBounds::Windowed(bounds)),
        titlebar: Some(TitlebarOptions {
            title: Some("Agent Flow Builder".into()),
            ..Default::default()
        }),
        app_id: Some("agent-builder".to_string()),
        ..Default::default()
    };

    cx.open_window(options, |window, cx| {
        let view = cx.new(|cx| BuilderApp::new(editor, Box::new(sink), window, cx));
        cx.new(|cx| Root::new(AnyView::from(view), window, cx))
    })
    .context("failed to open the builder window")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let settings = Settings::from_env()?;
    info!(save_path = %settings.save_path.display(), "starting agent builder");

    let app = Application::new().with_assets(Assets);
    app.run(move |cx| {
        gpui_component::init(cx);
        cx.bind_keys([
            KeyBinding::new("delete", DeleteSelected, Some(KEY_CONTEXT)),
            KeyBinding::new("backspace", DeleteSelected, Some(KEY_CONTEXT)),
            KeyBinding::new("escape", CancelGesture, Some(KEY_CONTEXT)),
        ]);
        cx.activate(true);

        if let Err(err) = open_main_window(settings, cx) {
            error!("{err:#}");
            cx.quit();
        }
    });
    Ok(())
}
