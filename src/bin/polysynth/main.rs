//! polysynth - play the synth from the computer keyboard
//!
//! Run with: cargo run -- --voices 8 --waveform saw

mod app;
mod keys;

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use polysynth::Waveform;

use app::Player;

struct Args {
    voices: usize,
    waveform: Waveform,
}

fn parse_args() -> EyreResult<Args> {
    let mut args = Args {
        voices: 4,
        waveform: Waveform::Sine,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--voices" => {
                let value = iter.next().ok_or_else(|| eyre!("--voices needs a value"))?;
                args.voices = value
                    .parse()
                    .wrap_err_with(|| format!("invalid voice count '{value}'"))?;
            }
            "--waveform" => {
                let value = iter.next().ok_or_else(|| eyre!("--waveform needs a value"))?;
                args.waveform = value.parse().map_err(|e| eyre!("{e}"))?;
            }
            "-h" | "--help" => {
                println!("usage: polysynth [--voices N] [--waveform sine|square|saw|triangle]");
                std::process::exit(0);
            }
            other => bail!("unknown argument '{other}'"),
        }
    }

    Ok(args)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let mut player = Player::open(args.voices, args.waveform)?;
    keys::run(&mut player)
}
