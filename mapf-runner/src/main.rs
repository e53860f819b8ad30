use anyhow::{anyhow, Result};
use clap::{arg, Command};
use mapf_instance::{GridMap, Instance};
use mapf_lns::Lns;
use mapf_structs::{LnsConfig, RunSummary};
use std::{fs, path::PathBuf};

fn cli() -> Command {
    Command::new("mapf-runner")
        .about("Runs or verifies multi-agent path finding solutions")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("solve")
                .about("Runs the adaptive LNS engine on an instance")
                .arg(
                    arg!(<MAP> "Path to a movingAI .map file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<SCENARIO> "Path to a movingAI .scen file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--config [CONFIG] "Config json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--agents [AGENTS] "Cap on the number of agents read from the scenario")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--seed [SEED] "Run seed")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"initial-paths" [SNAPSHOT] "Path snapshot json seeding the initial solution")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--stats [STATS_FILE] "Write the per-iteration csv to this path")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--summary [SUMMARY_FILE] "Append the summary row to this csv")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--paths [PATHS_FILE] "Write the final paths as snapshot json")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Verifies a path snapshot against an instance")
                .arg(
                    arg!(<MAP> "Path to a movingAI .map file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<SCENARIO> "Path to a movingAI .scen file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<PATHS> "Snapshot json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--agents [AGENTS] "Cap on the number of agents read from the scenario")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generates a random map and scenario")
                .arg(arg!(<SEED> "Instance seed").value_parser(clap::value_parser!(u64)))
                .arg(arg!(<ROWS>).value_parser(clap::value_parser!(usize)))
                .arg(arg!(<COLS>).value_parser(clap::value_parser!(usize)))
                .arg(arg!(<AGENTS>).value_parser(clap::value_parser!(usize)))
                .arg(
                    arg!(--"obstacle-ratio" [RATIO])
                        .default_value("0.1")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--output [PREFIX] "Write <PREFIX>.map and <PREFIX>.scen")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("solve", sub_m)) => solve(
            sub_m.get_one::<PathBuf>("MAP").unwrap().clone(),
            sub_m.get_one::<PathBuf>("SCENARIO").unwrap().clone(),
            sub_m.get_one::<String>("config").cloned(),
            sub_m.get_one::<usize>("agents").cloned(),
            *sub_m.get_one::<u64>("seed").unwrap(),
            sub_m.get_one::<PathBuf>("initial-paths").cloned(),
            sub_m.get_one::<PathBuf>("stats").cloned(),
            sub_m.get_one::<PathBuf>("summary").cloned(),
            sub_m.get_one::<PathBuf>("paths").cloned(),
        ),
        Some(("verify", sub_m)) => verify(
            sub_m.get_one::<PathBuf>("MAP").unwrap().clone(),
            sub_m.get_one::<PathBuf>("SCENARIO").unwrap().clone(),
            sub_m.get_one::<String>("PATHS").unwrap().clone(),
            sub_m.get_one::<usize>("agents").cloned(),
        ),
        Some(("generate", sub_m)) => generate(
            *sub_m.get_one::<u64>("SEED").unwrap(),
            *sub_m.get_one::<usize>("ROWS").unwrap(),
            *sub_m.get_one::<usize>("COLS").unwrap(),
            *sub_m.get_one::<usize>("AGENTS").unwrap(),
            *sub_m.get_one::<f64>("obstacle-ratio").unwrap(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_instance(map: &PathBuf, scenario: &PathBuf, agents: Option<usize>) -> Result<Instance> {
    let map_text = fs::read_to_string(map)?;
    let scen_text = fs::read_to_string(scenario)?;
    let grid = GridMap::parse(&map_text)?;
    let name = scenario
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    Ok(Instance::parse_scenario(grid, &scen_text, agents)?.with_name(name))
}

fn load_config(config: Option<String>) -> Result<LnsConfig> {
    let Some(config) = config else {
        return Ok(LnsConfig::default());
    };
    let text = if config.trim_start().starts_with('{') {
        config
    } else {
        fs::read_to_string(&config)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn run_seed(seed: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..8].copy_from_slice(&seed.to_be_bytes());
    out
}

#[allow(clippy::too_many_arguments)]
fn solve(
    map: PathBuf,
    scenario: PathBuf,
    config: Option<String>,
    agents: Option<usize>,
    seed: u64,
    initial_paths: Option<PathBuf>,
    stats_file: Option<PathBuf>,
    summary_file: Option<PathBuf>,
    paths_file: Option<PathBuf>,
) -> Result<()> {
    let instance = load_instance(&map, &scenario, agents)?;
    let config = load_config(config)?;

    let mut lns = Lns::new(instance, config, run_seed(seed));
    if let Some(snapshot_path) = initial_paths {
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&snapshot_path)?)?;
        let paths = lns.instance.load_snapshot(&value)?;
        lns = lns.with_initial_paths(paths);
    }
    let summary = lns.run()?;

    println!(
        "{}: iterations = {}, solution cost = {}, initial solution cost = {}, group size = {:.2}, failed iterations = {}",
        lns.backend_label(),
        summary.iterations,
        summary.final_cost,
        summary.initial_cost,
        summary.average_neighborhood_size,
        summary.failed_iterations
    );

    if let Some(path) = stats_file {
        write_iteration_csv(&lns, &summary, &path)?;
    }
    if let Some(path) = summary_file {
        append_summary_csv(&lns, &summary, &path)?;
    }
    if let Some(path) = paths_file {
        let snapshot = lns.instance.snapshot_json(&lns.solution());
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    }
    if !summary.success {
        return Err(anyhow!("no feasible initial solution within the time limit"));
    }
    Ok(())
}

fn write_iteration_csv(lns: &Lns, summary: &RunSummary, path: &PathBuf) -> Result<()> {
    let mut out = String::from("num_agents,sum_of_costs,runtime,lower_bound,sum_of_distances,algorithm\n");
    for stat in &lns.iteration_stats {
        out.push_str(&format!(
            "{},{},{:.6},{},{},{}\n",
            stat.num_agents,
            stat.sum_of_costs,
            stat.runtime,
            summary.lower_bound,
            summary.sum_of_distances,
            stat.backend
        ));
    }
    fs::write(path, out)?;
    Ok(())
}

/// Appends one summary row, creating the file with a header when missing.
fn append_summary_csv(lns: &Lns, summary: &RunSummary, path: &PathBuf) -> Result<()> {
    use std::io::Write;
    let exists = path.exists();
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    if !exists {
        writeln!(
            file,
            "runtime,solution_cost,initial_solution_cost,lower_bound,sum_of_distances,\
             iterations,group_size,runtime_of_initial_solution,restarts,\
             preprocessing_runtime,solver,instance,success"
        )?;
    }
    writeln!(
        file,
        "{:.6},{},{},{},{},{},{:.2},{:.6},{},{:.6},{},{},{}",
        summary.runtime,
        summary.final_cost,
        summary.initial_cost,
        summary.lower_bound,
        summary.sum_of_distances,
        summary.iterations,
        summary.average_neighborhood_size,
        summary.initial_runtime,
        summary.restarts,
        summary.preprocessing_time,
        lns.backend_label(),
        lns.instance.name(),
        summary.success
    )?;
    Ok(())
}

fn verify(map: PathBuf, scenario: PathBuf, paths: String, agents: Option<usize>) -> Result<()> {
    let instance = load_instance(&map, &scenario, agents)?;
    let text = if paths == "-" {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
        buf
    } else if paths.trim_start().starts_with('{') {
        paths
    } else {
        fs::read_to_string(&paths)?
    };
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let solution = instance.load_snapshot(&value)?;
    match instance.verify_solution(&solution) {
        Ok(cost) => {
            println!("Solution is valid, sum of costs = {}", cost);
            Ok(())
        }
        Err(e) => Err(anyhow!("Invalid solution: {}", e)),
    }
}

fn generate(
    seed: u64,
    rows: usize,
    cols: usize,
    agents: usize,
    obstacle_ratio: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    let instance = Instance::generate(&run_seed(seed), rows, cols, obstacle_ratio, agents)?;
    let map_text = instance.map.to_text();
    let mut scen_text = String::from("version 1\n");
    for i in 0..instance.num_agents() {
        let (s, g) = (instance.start(i), instance.goal(i));
        scen_text.push_str(&format!(
            "0\trandom\t{}\t{}\t{}\t{}\t{}\t{}\t0\n",
            instance.map.cols(),
            instance.map.rows(),
            instance.map.col_of(s),
            instance.map.row_of(s),
            instance.map.col_of(g),
            instance.map.row_of(g),
        ));
    }
    match output {
        Some(prefix) => {
            fs::write(prefix.with_extension("map"), map_text)?;
            fs::write(prefix.with_extension("scen"), scen_text)?;
            println!("Wrote {}.map and {}.scen", prefix.display(), prefix.display());
        }
        None => {
            print!("{}", map_text);
            print!("{}", scen_text);
        }
    }
    Ok(())
}
