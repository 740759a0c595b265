use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use colored::Colorize;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rlnc_coder::{CoderConfig, Decoder, Encoder, Zone};

/// Pushes one generation through a lossy channel and checks it decodes.
#[derive(Parser)]
struct Cli {
    /// Symbols per generation (ignored with --input).
    #[arg(long, default_value_t = 16)]
    symbols: usize,
    /// Bytes per symbol.
    #[arg(long, default_value_t = 1400)]
    symbol_size: usize,
    /// Probability that a payload is dropped.
    #[arg(long, default_value_t = 0.5)]
    loss: f64,
    /// Seed for data, loss and coefficients.
    #[arg(long)]
    seed: Option<u64>,
    /// Encode this file instead of random bytes.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Skip the uncoded pass and send only coded payloads.
    #[arg(long)]
    no_systematic: bool,
    /// Route traffic through a relay that recodes instead of forwarding.
    #[arg(long)]
    recode: bool,
    /// Print decoder trace events.
    #[arg(long)]
    trace: bool,
    /// Only print these trace zones (repeatable).
    #[arg(long = "trace-zone")]
    trace_zones: Vec<String>,
    /// Give up after this many payloads.
    #[arg(long, default_value_t = 100_000)]
    max_payloads: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !(0.0..1.0).contains(&cli.loss) {
        bail!("--loss must be in [0, 1), got {}", cli.loss);
    }

    let seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    info!("seed {} kernel {}", seed, rlnc_math::active_kernel());

    let (config, data_in) = match &cli.input {
        Some(path) => {
            let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let config = CoderConfig::for_data(data.len(), cli.symbol_size)?;
            (config, data)
        }
        None => {
            let config = CoderConfig::new(cli.symbols, cli.symbol_size)?;
            let mut data = vec![0u8; config.block_size()];
            rng.fill_bytes(&mut data);
            (config, data)
        }
    };
    info!(
        "generation: {} symbols x {} bytes ({} byte payloads)",
        config.max_symbols(),
        config.max_symbol_size(),
        config.payload_size()
    );

    let mut block = data_in.clone();
    block.resize(config.block_size(), 0);

    let mut encoder = Encoder::with_seed(config, rng.gen());
    encoder.set_symbols(&block)?;
    if cli.no_systematic {
        encoder.set_systematic_off();
    }

    let mut decoder = Decoder::with_seed(config, rng.gen());
    if cli.trace {
        install_trace(&mut decoder, &cli.trace_zones)?;
    }
    let mut relay = cli.recode.then(|| Decoder::with_seed(config, seed.wrapping_add(1)));

    let mut sent = 0u64;
    let mut delivered = 0u64;
    while !decoder.is_complete() {
        if sent >= cli.max_payloads {
            bail!("gave up after {} payloads at rank {}/{}", sent, decoder.rank(), config.max_symbols());
        }
        let payload = encoder.write_payload()?;
        sent += 1;

        if rng.gen_bool(cli.loss) {
            debug!("payload {} dropped", sent);
            continue;
        }
        delivered += 1;

        match relay.as_mut() {
            Some(relay) => {
                relay.read_payload(&payload);
                if let Some(recoded) = relay.recode() {
                    decoder.read_payload(&recoded);
                }
            }
            None => {
                // Payloads cross the channel as bytes.
                let wire = payload.to_bytes();
                decoder.decode(&wire)?;
            }
        }
    }

    let data_out = decoder.copy_symbols();
    info!(
        "complete: sent {} delivered {} rank {} ({} read by decoder)",
        sent,
        delivered,
        decoder.rank(),
        decoder.payloads_read()
    );

    if data_out[..data_in.len()] == data_in[..] {
        println!("{}", "Data decoded correctly".green());
        Ok(())
    } else {
        warn!("decoded block differs from input");
        println!("{}", "Unexpected failure to decode".red());
        Err(anyhow!("decoded data mismatch"))
    }
}

fn install_trace(decoder: &mut Decoder, names: &[String]) -> anyhow::Result<()> {
    let print = |zone: Zone, msg: &str| println!("{}:\n{}", zone.to_string().cyan(), msg);
    if names.is_empty() {
        decoder.trace(print);
        return Ok(());
    }

    let zones = names
        .iter()
        .map(|n| Zone::from_name(n).ok_or_else(|| anyhow!("unknown trace zone '{}'", n)))
        .collect::<anyhow::Result<Vec<Zone>>>()?;
    decoder.filtered_trace(move |zone| zones.contains(&zone), print);
    Ok(())
}
