//! Demo application: cpal stream setup and the render callback.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use std::time::Duration;

use subsynth::{build, AudioRenderer, EngineConfig};

use super::session::run_session;

pub struct DemoApp {
    config: EngineConfig,
}

impl DemoApp {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Run the demo (takes over, plays audio).
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let device_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = device_config.sample_rate().0 as f32;
        let channels = device_config.channels() as usize;

        let engine_config = EngineConfig {
            sample_rate,
            ..self.config
        };
        let (renderer, controller, mut snapshots) =
            build(engine_config).wrap_err("engine rejected the configuration")?;

        println!("=== subsynth demo ===");
        println!("Sample rate: {} Hz", sample_rate);
        println!("Buffer size: {} samples", engine_config.buffer_size);
        println!("Max voices: {}", engine_config.max_voices);
        println!();

        let mut callback = RenderCallback::new(renderer, channels);
        let stream = device
            .build_output_stream(
                &device_config.into(),
                move |data: &mut [f32], _info| callback.fill(data),
                |err| eprintln!("stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;
        stream.play().wrap_err("failed to start output stream")?;

        // Control thread: the event source feeding the engine's ingress.
        let control = std::thread::spawn(move || run_session(controller));

        // Observe while the session plays.
        while !control.is_finished() {
            std::thread::sleep(Duration::from_millis(500));
            if let Some(snapshot) = snapshots.latest() {
                let held: Vec<u8> = snapshot
                    .configured_voices()
                    .iter()
                    .filter(|v| v.active)
                    .map(|v| v.note)
                    .collect();
                println!(
                    "voices: {:2}  underruns: {}  notes: {:?}",
                    snapshot.active_voices, snapshot.underruns, held
                );
            }
        }
        control
            .join()
            .map_err(|_| eyre!("control thread panicked"))?;

        println!();
        println!(
            "done. underruns: {}, dropped events: {}",
            snapshots.stats().underruns(),
            snapshots.stats().dropped_events()
        );
        Ok(())
    }
}

/// Adapts fixed-size engine ticks to whatever callback sizes the device
/// asks for: render into a staging buffer, copy out, interleave mono
/// across the device channels.
struct RenderCallback {
    renderer: AudioRenderer,
    channels: usize,
    staging: Vec<f32>,
    position: usize,
}

impl RenderCallback {
    fn new(renderer: AudioRenderer, channels: usize) -> Self {
        let buffer_size = renderer.config().buffer_size;
        Self {
            renderer,
            channels,
            staging: vec![0.0; buffer_size],
            position: buffer_size, // force a render on first use
        }
    }

    fn fill(&mut self, data: &mut [f32]) {
        for frame in data.chunks_mut(self.channels) {
            if self.position >= self.staging.len() {
                self.renderer.render_tick(&mut self.staging);
                self.position = 0;
            }
            let sample = self.staging[self.position];
            self.position += 1;
            for out in frame.iter_mut() {
                *out = sample;
            }
        }
    }
}
