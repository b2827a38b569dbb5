//! Platter - headless two-deck host
//!
//! Scans a music folder, runs a console on a control thread against the
//! simulated engine, and plays a short scripted session through the
//! control surface, logging what the decks report.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing_subscriber::EnvFilter;

use platter_audio::{
    AudioCommand, Console, ConsoleEvent, ConsoleHandle, DeckConfig, DeckId, SimBackend, SimSound,
};
use platter_input::{Button, KnobKind, SliderRole, SurfaceEvent, SurfaceHandler};
use platter_library::{Config, LibraryScanner, ScanConfig, TrackTags};

/// Control ticks per second
const TICK_RATE: u64 = 60;

/// State updates per second
const STATE_RATE: u64 = 4;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load();
    let deck_config = DeckConfig::from_config(&config);

    let folder = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.music_folder.clone())
        .or_else(dirs::audio_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let scanner = LibraryScanner::new();
    let entries = scanner.scan(&ScanConfig::for_directory(&folder));
    for label in LibraryScanner::picker_labels(&entries) {
        tracing::debug!(%label, "picker");
    }

    let mut engine = SimBackend::probing_files();
    let tracks: Vec<PathBuf> = if entries.len() >= 2 {
        entries.iter().take(2).map(|e| e.path.clone()).collect()
    } else {
        tracing::info!("fewer than two tracks found, using demo tracks");
        register_demo_tracks(&mut engine)
    };

    let (handle, cmd_rx, evt_tx, evt_rx) = ConsoleHandle::create_channels();

    let control_handle = handle.clone();
    let control = thread::Builder::new()
        .name("platter-control".into())
        .spawn(move || run_control_thread(engine, deck_config, cmd_rx, evt_tx, control_handle))?;

    let result = run_session(&handle, &evt_rx, &tracks);

    handle.shutdown();
    if control.join().is_err() {
        anyhow::bail!("control thread panicked");
    }

    result
}

/// Two synthetic tracks a fifth apart in key, for running without a library
fn register_demo_tracks(engine: &mut SimBackend) -> Vec<PathBuf> {
    let demos = [
        ("demo/a-minor.ogg", "Night Drive", "Am", "124", "-6.5"),
        ("demo/e-minor.ogg", "Low Tide", "Em", "128", "-4.0"),
    ];
    demos
        .iter()
        .map(|(path, title, key, bpm, gain)| {
            let mut tags = TrackTags::default();
            tags.insert("title", *title);
            tags.insert("artist", "Platter");
            tags.insert("initialkey", *key);
            tags.insert("bpm", *bpm);
            tags.insert("replaygain_track_gain", format!("{} dB", gain));
            engine.register(
                *path,
                SimSound::new(240_000.0).with_tags(tags).with_load_ticks(12),
            );
            PathBuf::from(path)
        })
        .collect()
}

/// Drive the console at a fixed tick until shutdown
fn run_control_thread(
    mut engine: SimBackend,
    config: DeckConfig,
    cmd_rx: Receiver<AudioCommand>,
    evt_tx: Sender<ConsoleEvent>,
    handle: ConsoleHandle,
) {
    let mut console = Console::new(config);
    let tick = Duration::from_millis(1000 / TICK_RATE);
    let state_interval = Duration::from_millis(1000 / STATE_RATE);
    let mut last_tick = Instant::now();
    let mut last_state = Instant::now();

    while !handle.is_shutdown() {
        if !console.drain(&mut engine, &cmd_rx) {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        engine.advance(dt);
        for event in console.update(&mut engine, dt) {
            let _ = evt_tx.try_send(event);
        }

        if last_state.elapsed() >= state_interval {
            let _ = evt_tx.try_send(console.get_state());
            last_state = Instant::now();
        }

        thread::sleep(tick.saturating_sub(now.elapsed()));
    }

    for id in [DeckId::A, DeckId::B] {
        console.deck_mut(id).unload(&mut engine);
    }
    tracing::info!("control thread stopped");
}

/// Scripted surface gestures, as (seconds from start, event)
fn script(tracks: &[PathBuf]) -> Vec<(f32, SurfaceEvent)> {
    let mut steps = Vec::new();
    for (deck, path) in [DeckId::A, DeckId::B].into_iter().zip(tracks) {
        steps.push((0.0, SurfaceEvent::Load { deck, path: path.clone() }));
    }

    let button = |deck, button| SurfaceEvent::ButtonDown { deck, button };
    let pitch = |deck, position| SurfaceEvent::Slider {
        deck,
        role: SliderRole::Pitch,
        position,
    };

    steps.extend([
        (0.1, SurfaceEvent::Crossfader { position: 0.0 }),
        (0.1, button(DeckId::A, Button::Play)),
        (1.0, pitch(DeckId::A, 0.8)),
        (2.0, button(DeckId::A, Button::KeyLock)),
        (2.5, pitch(DeckId::A, 1.0)),
        (
            3.0,
            SurfaceEvent::Knob {
                deck: DeckId::A,
                kind: KnobKind::EqLow,
                angle: -90.0,
            },
        ),
        (
            3.2,
            SurfaceEvent::Knob {
                deck: DeckId::A,
                kind: KnobKind::Fx,
                angle: 60.0,
            },
        ),
        (3.5, SurfaceEvent::PlatterTouch { deck: DeckId::A, angle: 0.0 }),
    ]);

    // Back and forth over the record for half a second
    let mut angle = 0.0;
    for i in 0..30 {
        angle += if (i / 5) % 2 == 0 { 12.0 } else { -12.0 };
        steps.push((
            3.5 + i as f32 / TICK_RATE as f32,
            SurfaceEvent::PlatterMove {
                deck: DeckId::A,
                angle,
                dt: 1.0 / TICK_RATE as f32,
            },
        ));
    }

    steps.extend([
        (4.1, SurfaceEvent::PlatterRelease { deck: DeckId::A }),
        (4.5, button(DeckId::B, Button::Cue)),
        (5.0, SurfaceEvent::ButtonUp { deck: DeckId::B, button: Button::Cue }),
        (5.2, button(DeckId::B, Button::Play)),
        (5.5, SurfaceEvent::Crossfader { position: 0.5 }),
        (6.5, SurfaceEvent::Crossfader { position: 1.0 }),
        (7.0, button(DeckId::A, Button::Stop)),
    ]);
    steps
}

/// Play the script through the surface and log console events
fn run_session(
    handle: &ConsoleHandle,
    events: &Receiver<ConsoleEvent>,
    tracks: &[PathBuf],
) -> anyhow::Result<()> {
    let mut surface = SurfaceHandler::default();
    let steps = script(tracks);
    let end = steps.last().map(|(at, _)| *at).unwrap_or(0.0) + 1.0;
    let mut pending = steps.into_iter().peekable();

    let started = Instant::now();
    let frame = Duration::from_millis(1000 / TICK_RATE);

    loop {
        let elapsed = started.elapsed().as_secs_f32();
        if elapsed > end {
            break;
        }

        while let Some((_, event)) = pending.next_if(|(at, _)| *at <= elapsed) {
            if let Some(cmd) = surface.handle_event(event) {
                handle.send(cmd);
            }
        }

        while let Ok(event) = events.try_recv() {
            log_event(&event);
        }

        thread::sleep(frame);
    }
    Ok(())
}

fn log_event(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::TrackReady { deck, title } => {
            tracing::info!(deck = %deck.letter(), %title, "track ready")
        }
        ConsoleEvent::LoadFailed { deck, path, reason } => {
            tracing::warn!(deck = %deck.letter(), path = %path.display(), %reason, "load failed")
        }
        ConsoleEvent::TrackEnded { deck } => tracing::info!(deck = %deck.letter(), "track ended"),
        ConsoleEvent::StateUpdate {
            deck_a,
            deck_b,
            crossfader,
            harmonic_match,
        } => {
            for (letter, state) in [('A', deck_a), ('B', deck_b)] {
                let key = state.key.as_ref().map(|k| format!("{} ({})", k.name, k.camelot));
                tracing::info!(
                    deck = %letter,
                    playback = ?state.playback,
                    position_ms = state.position_ms.round(),
                    pitch = format_args!("{:.3}", state.pitch),
                    key_lock = state.key_lock,
                    bpm = ?state.bpm,
                    key = ?key,
                    volume = format_args!("{:.2}", state.volume),
                    scratching = state.scratching,
                    "deck"
                );
            }
            tracing::info!(crossfader, ?harmonic_match, "mixer");
        }
    }
}
