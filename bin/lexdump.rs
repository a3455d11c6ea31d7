use anyhow::{bail, Context, Result};
use clap::Parser;
use lexdump::{
    Compression, DocNo, DocOrder, DocumentAccessor, ExportPipeline, IndexHandle, OperationRunner,
    TermStatsReader, ToolConfig,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "lexdump")]
#[command(about = "Inspect and export the contents of an inverted index", long_about = None)]
struct Args {
    /// Index directory
    #[arg(long, env = "LEXDUMP_INDEX")]
    index: PathBuf,

    /// JSON configuration (field names, analyzer, export defaults)
    #[arg(long, env = "LEXDUMP_CONFIG")]
    config: Option<PathBuf>,

    /// Print index statistics
    #[arg(long)]
    stats: bool,

    /// Print statistics and postings of a term
    #[arg(long, value_name = "TERM")]
    print_term_info: Option<String>,

    /// Print the term vector of a document
    #[arg(long, value_name = "DOCID")]
    print_docvector: Option<String>,

    /// Write every docid to <index-name>.allDocids.<ext>
    #[arg(long, value_enum, value_name = "COMPRESSION")]
    dump_all_docids: Option<Compression>,

    /// Print the raw document
    #[arg(long, value_name = "DOCID")]
    dump_raw_doc: Option<String>,

    /// Write the raw documents listed in a file to <file>.output.tar.gz
    #[arg(long, value_name = "PATH")]
    dump_raw_docs: Option<PathBuf>,

    /// Like --dump-raw-docs, with a <DOCNO> line in front of each document
    #[arg(long, value_name = "PATH")]
    dump_raw_docs_with_docid: Option<PathBuf>,

    /// Print the transformed document
    #[arg(long, value_name = "DOCID")]
    dump_transformed_doc: Option<String>,

    /// Print the sentences of a document, one per line
    #[arg(long, value_name = "DOCID")]
    dump_sentences: Option<String>,

    /// Print the internal docno of a docid
    #[arg(long, value_name = "DOCID")]
    convert_docid_to_ordinal: Option<String>,

    /// Print the docid of an internal docno
    #[arg(long, value_name = "N")]
    convert_ordinal_to_docid: Option<u32>,

    /// Directory the docid dump is written to
    #[arg(long, env = "LEXDUMP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<ToolConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("Cannot read config {}", path.display()))?;
            ToolConfig::from_json(&data)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ToolConfig::default(),
    };
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    info!("lexdump v{} on {}", lexdump::VERSION, args.index.display());

    let handle = IndexHandle::open(&args.index)
        .with_context(|| format!("Cannot open index {}", args.index.display()))?;
    let fields = &config.fields;
    let accessor = DocumentAccessor::new(&handle, fields);
    let pipeline = ExportPipeline::new(&handle, fields, &config.export);
    let mut runner = OperationRunner::new();

    if args.stats {
        runner.run("stats", || {
            print!("{}", handle.stats(&fields.body));
            Ok(())
        })?;
    }

    if let Some(term) = &args.print_term_info {
        runner.run("print-term-info", || {
            let reader = TermStatsReader::new(&handle, fields, &config.analyzer);
            let record = reader.lookup(term)?;
            println!("{}", record);
            println!("postings:\n");
            for (docno, tf) in record.into_postings() {
                println!("\t{}, {}", docno, tf);
            }
            Ok(())
        })?;
    }

    if let Some(docid) = &args.print_docvector {
        runner.run("print-docvector", || {
            for (term, tf) in accessor.get_term_vector(docid)? {
                println!("{} {}", term, tf);
            }
            Ok(())
        })?;
    }

    if let Some(scheme) = args.dump_all_docids {
        runner.run("dump-all-docids", || {
            let order = DocOrder::detect(&handle, fields);
            pipeline.dump_all_docids(&order, scheme).map(|_| ())
        })?;
    }

    if let Some(docid) = &args.dump_raw_doc {
        runner.run("dump-raw-doc", || {
            println!("{}", accessor.get_raw(docid)?);
            Ok(())
        })?;
    }

    if let Some(list) = &args.dump_raw_docs {
        runner.run("dump-raw-docs", || {
            pipeline
                .dump_raw_documents(list, config.export.prepend_marker)
                .map(|_| ())
        })?;
    }

    if let Some(list) = &args.dump_raw_docs_with_docid {
        runner.run("dump-raw-docs-with-docid", || {
            pipeline.dump_raw_documents(list, true).map(|_| ())
        })?;
    }

    if let Some(docid) = &args.dump_transformed_doc {
        runner.run("dump-transformed-doc", || {
            println!("{}", accessor.get_transformed(docid)?);
            Ok(())
        })?;
    }

    if let Some(docid) = &args.dump_sentences {
        runner.run("dump-sentences", || {
            for sentence in accessor.get_sentences(docid)? {
                println!("{}", sentence);
            }
            Ok(())
        })?;
    }

    if let Some(docid) = &args.convert_docid_to_ordinal {
        runner.run("convert-docid-to-ordinal", || {
            println!("{}", accessor.resolver().resolve_internal(docid)?);
            Ok(())
        })?;
    }

    if let Some(ordinal) = args.convert_ordinal_to_docid {
        runner.run("convert-ordinal-to-docid", || {
            println!("{}", accessor.resolver().resolve_external(DocNo(ordinal))?);
            Ok(())
        })?;
    }

    drop(pipeline);
    drop(accessor);
    handle.close();

    if runner.failed() > 0 {
        bail!(
            "{} operation(s) failed: {}",
            runner.failed(),
            runner.failed_operations().join(", ")
        );
    }
    Ok(())
}
