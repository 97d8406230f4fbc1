use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use serde_json::json;

use map_agent_runtime::config::RuntimeConfig;
use map_agent_runtime::events::LayerPicker;
use map_agent_runtime::logging;
use map_agent_runtime::protocol::{ActionDescriptor, FAILURE_PREFIX, parse_action_list};
use map_agent_runtime::viewport::RecordingViewport;
use map_agent_runtime::ActionEngine;

fn demo_batch() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::new("camera_flyTo")
            .param("city", json!("北京"))
            .param("duration", json!(1.0))
            .wait_for_completion()
            .describe("飞往北京"),
        ActionDescriptor::new("set_weather")
            .param("condition", json!("rain"))
            .param("intensity", json!(0.8))
            .param("is_day", json!(true))
            .describe("北京下雨"),
        ActionDescriptor::new("layer_switch").param("layerType", json!("satellite")),
        ActionDescriptor::new("building_query")
            .param("city", json!("北京"))
            .param("min_height", json!(200)),
        ActionDescriptor::new("reset").delay_ms(500),
    ]
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("❌ {err}").red());
            return ExitCode::FAILURE;
        }
    };

    let actions = match std::env::args().nth(1) {
        Some(path) => {
            let loaded = std::fs::read_to_string(&path)
                .map_err(|err| err.to_string())
                .and_then(|raw| parse_action_list(&raw).map_err(|err| err.to_string()));
            match loaded {
                Ok(actions) => actions,
                Err(err) => {
                    eprintln!("{}", format!("❌ could not load {path}: {err}").red());
                    return ExitCode::FAILURE;
                }
            }
        }
        None => demo_batch(),
    };

    let viewport = Arc::new(RecordingViewport::new());
    let mut engine = match ActionEngine::builder()
        .viewport(viewport.clone())
        .config(config)
        .build()
    {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("{}", format!("❌ {err}").red());
            return ExitCode::FAILURE;
        }
    };
    let picker = LayerPicker::new(viewport.clone()).spawn(engine.subscribe_layers());

    let summary = engine.execute_actions(&actions).await;
    drop(engine);
    let _ = picker.await;

    println!("--- ACTIONS ---");
    for message in &summary.per_action_messages {
        if message.starts_with(FAILURE_PREFIX) {
            println!("{}", message.red());
        } else {
            println!("{}", message.green());
        }
    }

    println!("--- SUMMARY ---");
    println!(
        "{} succeeded, {} failed",
        summary.success_count.to_string().green(),
        summary.failed_count.to_string().red()
    );
    if let Some(data) = &summary.side_channel_data {
        println!("--- WEATHER ---\n{data:#}");
    }

    let snapshot = viewport.snapshot();
    println!("--- VIEWPORT ---");
    println!("camera: {:?}", snapshot.camera);
    println!("overlays: {}", snapshot.overlays.len());
    if let Some(imagery) = &snapshot.imagery {
        println!("imagery: {}", imagery.name);
    }

    if summary.overall_success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
