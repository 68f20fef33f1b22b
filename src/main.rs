use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use yamlgraft::config::Config;
use yamlgraft::document::{NodeKind, YamlNode};
use yamlgraft::file::loader::{load_yaml_file, load_yaml_from_stdin};
use yamlgraft::file::saver::{encode_documents, save_yaml_file};
use yamlgraft::yamlpath::Parser as PathParser;
use yamlgraft::{Document, Node, Path};

/// yamlgraft - edit YAML files by path without losing comments
#[derive(Parser)]
#[command(name = "yamlgraft")]
#[command(version)]
#[command(about = "Edit YAML files by path without losing comments", long_about = None)]
struct Cli {
    /// Spaces per indentation level (default: from config, 2)
    #[arg(long, global = true)]
    indent: Option<usize>,

    /// Document to operate on in a multi-document file
    #[arg(long, global = true, default_value_t = 0)]
    doc: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node at PATH
    Get {
        /// YAML file, or - for stdin
        file: String,
        /// Path such as spec.ports[0].name, or $ for the root
        path: String,
        /// Print as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Write VALUE at PATH, creating missing keys on the way
    Set {
        file: String,
        path: String,
        /// Value, parsed as YAML unless --string is given
        value: String,
        /// Allow changing the kind of the existing node
        #[arg(long)]
        replace: bool,
        /// Store VALUE as a plain string
        #[arg(long)]
        string: bool,
        /// Overwrite FILE instead of printing the result
        #[arg(short, long)]
        in_place: bool,
    },
    /// Remove the entry at PATH
    Delete {
        file: String,
        path: String,
        #[arg(short, long)]
        in_place: bool,
    },
    /// Change the comments around the node at PATH
    Comment {
        file: String,
        path: String,
        /// Comment on the lines above
        #[arg(long)]
        head: Option<String>,
        /// Comment at the end of the line
        #[arg(long)]
        line: Option<String>,
        /// Comment on the lines below
        #[arg(long)]
        foot: Option<String>,
        /// Target the mapping key instead of its value
        #[arg(long)]
        key: bool,
        #[arg(short, long)]
        in_place: bool,
    },
    /// Re-encode FILE with uniform indentation
    Fmt {
        file: String,
        #[arg(short, long)]
        in_place: bool,
    },
    /// Dump the decoded node tree
    Tree { file: String },
}

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with YAML on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yamlgraft=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(indent) = cli.indent {
        config.indent_size = indent;
    }
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Get { file, path, json } => {
            let docs = load(&file)?;
            let doc = select(&docs, cli.doc)?;
            let node = lookup(doc, &parse_path(&path)?)?;
            let mut stdout = io::stdout().lock();
            if json {
                let text = serde_json::to_string_pretty(&node)
                    .context("Failed to convert node to JSON")?;
                writeln!(stdout, "{}", text)?;
            } else {
                stdout.write_all(&node.bytes(config.indent_size)?)?;
            }
            Ok(())
        }
        Commands::Set {
            file,
            path,
            value,
            replace,
            string,
            in_place,
        } => {
            let docs = load(&file)?;
            let doc = select(&docs, cli.doc)?;
            let path = parse_path(&path)?;
            let value: serde_yaml::Value = if string {
                serde_yaml::Value::String(value)
            } else {
                serde_yaml::from_str(&value)
                    .with_context(|| format!("VALUE is not valid YAML: {}", value))?
            };

            let replace = replace || config.allow_kind_change;
            match (path.is_empty(), replace) {
                (true, false) => doc.set(&value)?,
                (true, true) => doc.replace(&value)?,
                (false, false) => {
                    doc.set_at(&path, &value)?;
                }
                (false, true) => {
                    doc.replace_at(&path, &value)?;
                }
            }
            finish(&file, &docs, &config, in_place)
        }
        Commands::Delete {
            file,
            path,
            in_place,
        } => {
            let docs = load(&file)?;
            let doc = select(&docs, cli.doc)?;
            let path = parse_path(&path)?;
            if path.is_empty() {
                bail!("Cannot delete the document root");
            }
            doc.delete_key(&path)?;
            finish(&file, &docs, &config, in_place)
        }
        Commands::Comment {
            file,
            path,
            head,
            line,
            foot,
            key,
            in_place,
        } => {
            let docs = load(&file)?;
            let doc = select(&docs, cli.doc)?;
            let path = parse_path(&path)?;
            if key {
                let key_node = doc
                    .get_key(&path)
                    .with_context(|| format!("No mapping key at {}", path))?;
                if let Some(head) = head {
                    key_node.set_head_comment(head);
                }
                if let Some(line) = line {
                    key_node.set_line_comment(line);
                }
                if let Some(foot) = foot {
                    key_node.set_foot_comment(foot);
                }
            } else {
                let node = lookup(doc, &path)?;
                if let Some(head) = head {
                    node.set_head_comment(head);
                }
                if let Some(line) = line {
                    node.set_line_comment(line);
                }
                if let Some(foot) = foot {
                    node.set_foot_comment(foot);
                }
            }
            finish(&file, &docs, &config, in_place)
        }
        Commands::Fmt { file, in_place } => {
            let docs = load(&file)?;
            finish(&file, &docs, &config, in_place)
        }
        Commands::Tree { file } => {
            let docs = load(&file)?;
            let doc = select(&docs, cli.doc)?;
            let mut out = String::new();
            dump_tree(&doc.node().borrow(), 0, &mut out);
            io::stdout().lock().write_all(out.as_bytes())?;
            Ok(())
        }
    }
}

fn load(file: &str) -> Result<Vec<Document>> {
    if file == "-" {
        load_yaml_from_stdin()
    } else {
        load_yaml_file(file)
    }
}

fn select(docs: &[Document], index: usize) -> Result<&Document> {
    docs.get(index).with_context(|| {
        format!(
            "Document {} does not exist, the input holds {}",
            index,
            docs.len()
        )
    })
}

fn parse_path(expr: &str) -> Result<Path> {
    let path = PathParser::parse(expr).with_context(|| format!("Invalid path: {}", expr))?;
    path.validate()?;
    Ok(path)
}

/// The node at `path`, where an empty path means the document root.
fn lookup(doc: &Document, path: &Path) -> Result<Node> {
    if path.is_empty() {
        Ok(doc.root()?)
    } else {
        Ok(doc.lookup(path)?)
    }
}

/// Writes the edited documents back to `file`, or to stdout.
fn finish(file: &str, docs: &[Document], config: &Config, in_place: bool) -> Result<()> {
    if in_place {
        if file == "-" {
            bail!("--in-place cannot be used with stdin");
        }
        save_yaml_file(file, docs, config)
    } else {
        let out = encode_documents(docs, config.indent_size)?;
        io::stdout().lock().write_all(&out)?;
        Ok(())
    }
}

fn dump_tree(node: &YamlNode, depth: usize, out: &mut String) {
    use std::fmt::Write as _;

    let pad = "  ".repeat(depth);
    let _ = write!(
        out,
        "{}{} style={} tag={} line={} col={}",
        pad, node.kind, node.style, node.tag, node.line, node.column
    );
    if !node.anchor.is_empty() {
        let _ = write!(out, " anchor={}", node.anchor);
    }
    match node.kind {
        NodeKind::Scalar => {
            let _ = write!(out, " value={:?}", node.value);
        }
        NodeKind::Alias => {
            let target = node
                .alias
                .as_ref()
                .map(|t| t.borrow().anchor.clone())
                .unwrap_or_default();
            let _ = write!(out, " alias={}", target);
        }
        _ => {}
    }
    out.push('\n');
    for (label, comment) in [
        ("head", &node.head_comment),
        ("line", &node.line_comment),
        ("foot", &node.foot_comment),
    ] {
        if !comment.is_empty() {
            let _ = writeln!(out, "{}  {}: {:?}", pad, label, comment);
        }
    }
    for child in &node.content {
        dump_tree(&child.borrow(), depth + 1, out);
    }
}
