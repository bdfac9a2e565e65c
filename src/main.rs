use clap::{Arg, Command};
use dronetrack::logging::{init_logging, level_for_verbosity, parse_log_level, LogConfig, LogOutput};
use dronetrack::models::{Ring, SimulationConstants, Track, Vector3D};
use dronetrack::pilot::WaypointPilot;
use dronetrack::report::{LogReporter, YamlReporter};
use dronetrack::scenario::ScenarioConfig;
use dronetrack::simulation::SimulationEngine;
use std::str::FromStr;
use tracing::info;

/// デモモードの最大ステップ数
const DEMO_MAX_STEPS: u64 = 10_000;

fn main() {
    let matches = Command::new("dronetrack")
        .version("0.1.0")
        .about("ドローン飛行トラックシミュレーション")
        .long_about("リング状のウェイポイントを持つトラック列をドローンが飛行する\n\
                     時間駆動型の運動学シミュレーションです。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("demo")
        )
        .arg(
            Arg::new("demo")
                .short('d')
                .long("demo")
                .action(clap::ArgAction::SetTrue)
                .help("組み込みのデモトラックで実行")
                .conflicts_with("scenario")
        )
        .arg(
            Arg::new("report-dir")
                .short('r')
                .long("report-dir")
                .value_name("DIR")
                .help("トラックごとの統計をYAMLで出力するディレクトリ")
        )
        .arg(
            Arg::new("max-steps")
                .long("max-steps")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("最大ステップ数（シナリオの設定を上書き）")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: 毎ティック)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        None => LogOutput::Console,
    };
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| level_for_verbosity(verbose_level));
    let log_config = LogConfig {
        level,
        output,
        ..LogConfig::default()
    };
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化に失敗しました: {}", e);
            std::process::exit(1);
        }
    };

    let report_dir = matches.get_one::<String>("report-dir").cloned();
    let max_steps = matches.get_one::<u64>("max-steps").copied();

    let result = if matches.get_flag("demo") {
        run_demo(report_dir, max_steps.unwrap_or(DEMO_MAX_STEPS), verbose_level)
    } else if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        run_scenario(scenario_path, matches.get_flag("info"), report_dir, max_steps, verbose_level)
    } else {
        show_default_help();
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    report_dir: Option<String>,
    max_steps: Option<u64>,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;
    info!("シナリオファイル読み込み完了: {}", scenario_path);

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    scenario.print_summary();
    println!();

    let tracks = scenario.to_tracks()?;
    let mut pilot = scenario.pilot();
    let max_steps = max_steps.unwrap_or(scenario.sim.max_steps);

    execute(tracks, scenario.constants(), &mut pilot, report_dir, max_steps, verbose_level)
}

/// 組み込みのデモトラック（上昇 → 水平移動）で実行
fn run_demo(
    report_dir: Option<String>,
    max_steps: u64,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== デモモード ===");

    let climb = Track::new(
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(0.0, 0.0, 20.0),
        vec![Ring::at(Vector3D::new(0.0, 0.0, 10.0))?],
        60.0,
    )?
    .with_name("climb");

    let cruise = Track::new(
        Vector3D::new(0.0, 0.0, 20.0),
        Vector3D::new(60.0, 20.0, 25.0),
        vec![
            Ring::at(Vector3D::new(20.0, 0.0, 22.0))?,
            Ring::at(Vector3D::new(40.0, 10.0, 28.0))?,
        ],
        90.0,
    )?
    .with_name("cruise");

    let mut pilot = WaypointPilot::default();
    execute(
        vec![climb, cruise],
        SimulationConstants::default(),
        &mut pilot,
        report_dir,
        max_steps,
        verbose_level,
    )
}

fn execute(
    tracks: Vec<Track>,
    constants: SimulationConstants,
    pilot: &mut WaypointPilot,
    report_dir: Option<String>,
    max_steps: u64,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    if verbose_level > 0 {
        println!("シミュレーション設定:");
        println!("  時間刻み: {:.3}秒", constants.dt);
        println!("  速度収束レート: {:.1}m/s²", constants.speed_rate);
        println!("  回転収束レート: {:.3}rad/s", constants.rotation_rate);
        println!("  最大ステップ数: {}", max_steps);
        println!();
    }

    let mut simulation = SimulationEngine::new(tracks, constants)?.with_verbose_level(verbose_level);
    simulation.add_reporter(Box::new(LogReporter));
    if let Some(dir) = report_dir {
        simulation.add_reporter(Box::new(YamlReporter::new(dir)));
    }

    simulation.run(pilot, max_steps)?;

    println!();
    simulation.print_summary();

    Ok(())
}

/// デフォルトヘルプを表示
fn show_default_help() {
    println!("使用方法:");
    println!("  dronetrack [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -d, --demo               組み込みのデモトラックで実行");
    println!("  -r, --report-dir <DIR>   トラックごとの統計をYAMLで出力");
    println!("      --max-steps <N>      最大ステップ数");
    println!("      --log-output <T>     ログ出力先 (console, file, both)");
    println!("      --log-level <LEVEL>  ログレベル");
    println!("  -v, --verbose            詳細出力 (複数指定で詳細レベル上昇)");
    println!("  -h, --help               このヘルプを表示");
    println!();
    println!("例:");
    println!("  dronetrack -s scenarios/single_track.yaml");
    println!("  dronetrack -s scenarios/multi_track.yaml -v -r reports");
    println!("  dronetrack -s scenarios/multi_track.yaml -i");
    println!("  dronetrack --demo");
}
