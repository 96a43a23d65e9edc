use clap::Parser;
use colored::Colorize;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use dt_tube::Dna;
use dt_tube::FailureRates;
use dt_tube::Tube;

/// Walk a few DNA molecules through a round of simulated lab work.
#[derive(Parser, Debug)]
#[command(name = "tube_demo")]
#[command(version, about = "Anneal, cut, melt and select DNA in a simulated tube", long_about = None)]
struct Cli {
    /// Seed for the failure draws (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Probability that filtering loses a matching molecule
    #[arg(long, default_value = "0.01")]
    filter_failure: f64,

    /// Probability that PCR fails to amplify a matching molecule
    #[arg(long, default_value = "0.01")]
    amplify_failure: f64,
}

fn section(title: &str) {
    println!("{}", format!("-- {title} --").bold().cyan());
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let rates = FailureRates::new(cli.filter_failure, cli.amplify_failure)?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    info!("failure rates: filter {}, amplify {}", rates.filter(), rates.amplify());

    section("Trimming");
    for (main, opposite) in [("   ATCG   ", None), ("   ATCG   ", Some("   TAGC   ")), ("   ATC    ", Some("     GC   "))] {
        let dna = Dna::new(main, opposite)?;
        println!("{:?} / {:?}", dna.main(), dna.opposite());
    }

    let mut tube = Tube::with_rng(rng, rates);
    tube.extend([
        (Dna::try_from("TACGA")?, 1),
        (Dna::try_from("ATGC")?, 2),
        (Dna::try_from("ATACG")?, 1),
    ]);

    section("Cool");
    tube.cool();
    println!("{tube}");

    section("Cleave TG");
    tube.cleave("TG");
    println!("{tube}");

    section("Separate");
    tube.separate();
    println!("{tube}");

    // Clause selection the way an encoding layer drives a tube: one
    // branch per satisfying literal choice, merged afterwards.
    section("Select (x1 or x2)");
    let literals = [("AAAC", "CCCA"), ("GGGT", "TTTG")];
    let mut pool = Tube::with_rng(StdRng::seed_from_u64(cli.seed.unwrap_or(0)), rates);
    for x1 in [literals[0].0, literals[0].1] {
        for x2 in [literals[1].0, literals[1].1] {
            pool.insert(Dna::try_from(format!("{x1}{x2}").as_str())?, 1);
        }
    }
    pool.amplify("", 3);

    let mut selected = Tube::with_rng(StdRng::seed_from_u64(cli.seed.unwrap_or(0)), rates);
    for choice in [(literals[0].0, literals[1].0), (literals[0].0, literals[1].1), (literals[0].1, literals[1].0)] {
        let mut branch = pool.duplicate();
        branch.filter(choice.0);
        branch.filter(choice.1);
        selected.add(&branch);
    }
    for (len, dna) in selected.length_sort() {
        println!("{len:>3} {dna} x{}", selected.count(dna));
    }

    Ok(())
}
