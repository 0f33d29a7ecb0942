use bevy::prelude::*;

use stellar_signature::{SignatureConfig, SignaturePlugin, Stage};

fn main() {
    let mut config = SignatureConfig::default();

    // Optional first argument: initial stage name
    let cli_error = std::env::args().nth(1).and_then(|arg| match arg.parse::<Stage>() {
        Ok(stage) => {
            config.initial_stage = stage;
            None
        }
        Err(err) => Some(err),
    });

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Stellar Signature".to_string(),
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.01, 0.005, 0.02)))
    .insert_resource(config)
    .add_plugins(SignaturePlugin);

    // Logged once the log plugin is up
    if let Some(err) = cli_error {
        app.add_systems(Startup, move || warn!("{err}; starting as nebula"));
    }

    app.run();
}
