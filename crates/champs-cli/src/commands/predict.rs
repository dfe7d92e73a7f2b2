use crate::cli::PredictArgs;
use crate::config::PartialPipelineConfig;
use crate::error::Result;
use crate::utils::inputs;
use crate::utils::progress::CliProgressHandler;
use champs::core::io::submission::SubmissionFile;
use champs::core::io::traits::TableFile;
use champs::engine::features::FeatureRegistry;
use champs::engine::progress::ProgressReporter;
use champs::workflows::{predict, tune};
use tracing::{info, warn};

pub fn run(args: PredictArgs) -> Result<()> {
    let config = PartialPipelineConfig::load(&args.input.config)?;
    let bond_config = config.bond_config()?;
    let data = config.data_options(args.input.nrows, args.input.cache_dir.as_deref());

    let study_path = config.study_path(args.study.as_deref());
    let best = tune::load_best_params(&study_path)?;
    let final_config = config.merge_prediction(&args, best.as_ref())?;
    info!(
        features = ?final_config.feature_names,
        target = %final_config.target,
        model = %final_config.model,
        "Resolved prediction configuration."
    );

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
    let test = inputs::read_pair_rows(&args.test, &data, &structure, None)?;

    println!(
        "Training on {} rows with {}-fold cross-validation...",
        train.len(),
        final_config.validation.n_splits
    );
    let outcome = predict::run(
        &train,
        &test,
        &final_config,
        &FeatureRegistry::with_builtin(),
        &reporter,
    )?;

    for (fold, score) in outcome.fold_scores.iter().enumerate() {
        println!("  Fold {}: {:.5}", fold + 1, score);
    }
    println!("CV score (group log-MAE): {:.5}", outcome.mean_score);

    if test.is_empty() {
        warn!("Test table is empty; the submission holds only a header.");
    }
    let submission = outcome.submission(&test);
    info!("Writing {} predictions to {:?}", submission.len(), &args.output);
    SubmissionFile::write_to_path(&submission, &args.output)?;
    println!(
        "✓ Submission with {} rows written to: {}",
        submission.len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use crate::utils::inputs::fixtures::{Dataset, write_dataset};
    use champs::engine::config::ModelParams;
    use champs::workflows::tune::{BestParams, save_best_params};
    use clap::Parser;
    use std::path::Path;
    use tempfile::tempdir;

    fn predict_args(data: &Dataset, output: &Path, features: &str, extra: &[&str]) -> PredictArgs {
        let mut argv = vec![
            "champs",
            "predict",
            "--train",
            data.train.to_str().unwrap(),
            "--test",
            data.test.to_str().unwrap(),
            "-s",
            data.structures.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--features",
            features,
            "--n-splits",
            "3",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Predict(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn writes_one_prediction_per_test_row() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 20);
        let output = dir.path().join("submission.csv");
        let study = dir.path().join("study.toml");

        run(predict_args(&data, &output, "Type,Distance", &["--study", study.to_str().unwrap()])).unwrap();

        let rows = SubmissionFile::read_from_path(&output, None).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].id, 1003);
        assert!(rows.iter().all(|r| r.scalar_coupling_constant.is_finite()));
        assert!(!study.exists());
    }

    #[test]
    fn ridge_model_can_be_selected() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 20);
        let output = dir.path().join("ridge.csv");
        let study = dir.path().join("study.toml");

        run(predict_args(
            &data,
            &output,
            "Distance",
            &["--model", "ridge", "--alpha", "0.01", "--study", study.to_str().unwrap()],
        ))
        .unwrap();
        let rows = SubmissionFile::read_from_path(&output, None).unwrap();
        // The fixture target is close to 80 + 50 * distance.
        for row in &rows {
            assert!((125.0..=150.0).contains(&row.scalar_coupling_constant), "{}", row.scalar_coupling_constant);
        }
    }

    #[test]
    fn contribution_target_is_read_from_the_contribution_table() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 20);
        let output = dir.path().join("fc.csv");
        let study = dir.path().join("study.toml");

        run(predict_args(
            &data,
            &output,
            "Type,Distance",
            &[
                "--target",
                "fc",
                "--contributions",
                data.contributions.to_str().unwrap(),
                "--study",
                study.to_str().unwrap(),
            ],
        ))
        .unwrap();
        assert_eq!(SubmissionFile::read_from_path(&output, None).unwrap().len(), 5);
    }

    #[test]
    fn contribution_target_without_table_fails() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 12);
        let output = dir.path().join("fc.csv");
        let study = dir.path().join("study.toml");
        let result = run(predict_args(
            &data,
            &output,
            "Type,Distance",
            &["--target", "fc", "--study", study.to_str().unwrap()],
        ));
        assert!(matches!(result, Err(CliError::Argument(_))));
        assert!(!output.exists());
    }

    #[test]
    fn unknown_feature_is_reported() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 12);
        let output = dir.path().join("submission.csv");
        let study = dir.path().join("study.toml");
        let result = run(predict_args(
            &data,
            &output,
            "Type,Spin",
            &["--study", study.to_str().unwrap()],
        ));
        assert!(matches!(result, Err(CliError::Core(_))));
    }

    #[test]
    fn malformed_study_file_fails_before_training() {
        let dir = tempdir().unwrap();
        let data = write_dataset(dir.path(), 12);
        let output = dir.path().join("submission.csv");
        let study = dir.path().join("study.toml");
        std::fs::write(&study, "alpha = [").unwrap();

        let result = run(predict_args(&data, &output, "Type,Distance", &["--study", study.to_str().unwrap()]));
        assert!(matches!(result, Err(CliError::Core(_))));

        save_best_params(
            &study,
            &BestParams {
                score: -1.0,
                target: "scalar_coupling_constant".to_string(),
                features: vec!["Type".to_string(), "Distance".to_string()],
                n_trials: 3,
                params: ModelParams::Ridge { alpha: 0.3 },
            },
        )
        .unwrap();
        run(predict_args(
            &data,
            &output,
            "Type,Distance",
            &["--model", "ridge", "--study", study.to_str().unwrap()],
        ))
        .unwrap();
        assert!(output.is_file());
    }
}
