mod prefs;

use berth_embed::{ConfigError, ServiceConfig};
use berth_launch::{launch, ReadinessPolicy};
use tauri::Manager;

/// Resolve the service configuration once, before anything is started.
/// Environment variables win; the preferences file may supply a port.
fn shell_config() -> Result<ServiceConfig, ConfigError> {
    if std::env::var("BERTH_PORT").is_ok() {
        return ServiceConfig::from_env();
    }
    match prefs::port_override() {
        Some(port) => ServiceConfig::from_env_with_port(port),
        None => ServiceConfig::from_env(),
    }
}

fn main() {
    berth_otel::init();

    let config = match shell_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "refusing to launch");
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    // The service must be confirmed listening before any window exists;
    // a failed launch exits here instead of showing a blank webview.
    let launch_state =
        match tauri::async_runtime::block_on(launch(config, ReadinessPolicy::default())) {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(%err, "launch aborted");
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        };
    let window_url = launch_state.window_url();

    tauri::Builder::<tauri::Wry>::default()
        .plugin(tauri_plugin_window_state::Builder::default().build::<tauri::Wry>())
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            // Focus the existing window on second-instance attempt
            if let Some(w) = app.get_webview_window("main") {
                let _ = w.set_focus();
            }
        }))
        .manage(launch_state)
        .setup(move |app| {
            tauri::WebviewWindowBuilder::new(
                app,
                "main",
                tauri::WebviewUrl::External(window_url.parse()?),
            )
            .title("Berth")
            .inner_size(1100.0, 800.0)
            .build()?;
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
