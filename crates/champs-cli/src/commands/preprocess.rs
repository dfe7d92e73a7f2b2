use crate::cli::PreprocessArgs;
use crate::config::PartialPipelineConfig;
use crate::error::Result;
use crate::utils::inputs;
use crate::utils::progress::CliProgressHandler;
use champs::core::io::structures::AnnotatedStructureFile;
use champs::core::io::traits::TableFile;
use champs::engine::progress::ProgressReporter;
use tracing::info;

pub fn run(args: PreprocessArgs) -> Result<()> {
    let config = PartialPipelineConfig::load(&args.config)?;
    let bond_config = config.bond_config()?;
    let data = config.data_options(None, args.cache_dir.as_deref());
    let cache_dir = if args.no_cache {
        info!("Table cache disabled.");
        None
    } else {
        data.cache_dir.as_deref()
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Inferring bonds...");
    let annotated = inputs::annotate(&args.structures, &bond_config, cache_dir, &reporter)?;

    info!("Writing annotated structures to {:?}", &args.output);
    AnnotatedStructureFile::write_to_path(annotated.atoms(), &args.output)?;
    println!(
        "✓ Annotated {} atoms written to: {}",
        annotated.len(),
        args.output.display()
    );
    Ok(())
}
