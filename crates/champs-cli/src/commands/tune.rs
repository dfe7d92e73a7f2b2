use crate::cli::TuneArgs;
use crate::config::PartialPipelineConfig;
use crate::error::Result;
use crate::utils::inputs;
use crate::utils::progress::CliProgressHandler;
use champs::engine::config::ModelKind;
use champs::engine::features::FeatureRegistry;
use champs::engine::progress::ProgressReporter;
use champs::workflows::tune;
use tracing::info;

pub fn run(args: TuneArgs) -> Result<()> {
    let config = PartialPipelineConfig::load(&args.input.config)?;
    let bond_config = config.bond_config()?;
    let data = config.data_options(args.input.nrows, args.input.cache_dir.as_deref());
    let final_config = config.merge_tuning(&args)?;
    let study_path = config.study_path(args.study.as_deref());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let structure = inputs::annotate(
        &args.input.structures,
        &bond_config,
        data.cache_dir.as_deref(),
        &reporter,
    )?;
    let contributions =
        inputs::read_contributions(args.input.contributions.as_deref(), final_config.target)?;
    let train = inputs::read_pair_rows(
        &args.input.train,
        &data,
        &structure,
        contributions.as_deref(),
    )?;

    match final_config.model {
        ModelKind::Ridge => println!(
            "Searching {} ridge penalties in [{}, {}]...",
            final_config.n_trials, final_config.alpha_range.0, final_config.alpha_range.1
        ),
        ModelKind::GradientBoosting => {
            let space = &final_config.boosting_space;
            println!(
                "Searching {} gradient boosting settings (iterations {:?}, max depth {:?}, min leaf size {:?}, learning rate {:?})...",
                final_config.n_trials,
                space.iterations,
                space.max_depth,
                space.min_leaf_size,
                space.learning_rate
            );
        }
    }
    let outcome = tune::run(
        &train,
        &final_config,
        &FeatureRegistry::with_builtin(),
        &reporter,
    )?;
    for (i, trial) in outcome.trials.iter().enumerate() {
        println!("  Trial {:>3}: score = {:.5}  {}", i + 1, trial.score, trial.params);
    }
    println!(
        "Best of this run: {} (score {:.5})",
        outcome.best.params, outcome.best.score
    );

    info!("Recording best parameters in {:?}", &study_path);
    let recorded = tune::record_best_params(&study_path, outcome.best)?;
    println!(
        "✓ Study {} now holds {} (score {:.5}, {} trials in total).",
        study_path.display(),
        recorded.params,
        recorded.score,
        recorded.n_trials
    );
    Ok(())
}
