//! Command dispatch: wire parsed arguments to the annotation engine.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::annotate::{AnnotationState, Annotator};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::scene::Scene;
use crate::config::{self, Settings};
use crate::render::{NodeId, RenderTree};
use crate::vocabulary;

pub fn execute_command(cli: &Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Settings::load().context("loading configuration")?,
    };

    match &cli.command {
        Some(Commands::Annotate { scene, output }) => {
            _annotate(scene, output.as_deref(), settings)
        }
        Some(Commands::Tree { scene }) => _tree(scene, settings),
        Some(Commands::Types { properties }) => _types(*properties),
        Some(Commands::Config { command }) => _config(command, &settings),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Run every staged entity through its full lifecycle: initial request,
/// then the readiness signal for anything that parked as pending.
fn run_scene(scene: &mut Scene, settings: Settings) -> Annotator {
    let mut annotator = Annotator::new(settings);

    for staged in &scene.staged {
        annotator.request(&mut scene.host, &staged.entity, &scene.discovery);
    }
    for staged in &scene.staged {
        if staged.deferred {
            scene.discovery.mark_ready(&staged.entity.id);
            annotator.handle_event(
                &mut scene.host,
                &staged.entity,
                &scene.discovery,
                staged.kind.readiness_event(),
            );
        }
    }
    annotator
}

fn report(annotator: &Annotator, scene: &Scene) {
    for staged in &scene.staged {
        match annotator.state(&staged.entity.id) {
            Some(AnnotationState::Annotated(splices)) => output::success(&format!(
                "{} ({}): {} container(s)",
                staged.entity.id,
                staged.entity.itemtype,
                splices.len()
            )),
            Some(AnnotationState::Skipped(reason)) => {
                output::failure(&format!("{}: {}", staged.entity.id, reason))
            }
            Some(AnnotationState::Pending) | None => {
                output::warning(&format!("{}: no render target found", staged.entity.id))
            }
        }
    }
}

#[instrument(level = "debug", skip(settings))]
fn _annotate(scene_path: &Path, out: Option<&Path>, settings: Settings) -> Result<()> {
    let mut scene = Scene::load(scene_path)?;
    let annotator = run_scene(&mut scene, settings);
    report(&annotator, &scene);

    let markup = scene.host.to_markup(scene.root);
    match out {
        Some(path) => {
            std::fs::write(path, &markup)
                .with_context(|| format!("writing {}", path.display()))?;
            output::action("Wrote", &path.display());
        }
        None => print!("{}", markup),
    }
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn _tree(scene_path: &Path, settings: Settings) -> Result<()> {
    let mut scene = Scene::load(scene_path)?;
    let annotator = run_scene(&mut scene, settings);
    report(&annotator, &scene);

    let tree = render_termtree(&scene.host, scene.root);
    println!("{}", tree);
    Ok(())
}

fn render_termtree(host: &RenderTree, id: NodeId) -> termtree::Tree<String> {
    let label = match host.get(id) {
        Some(node) => {
            let attrs = node
                .attrs
                .iter()
                .map(|(k, v)| format!(" {}=\"{}\"", k, v))
                .collect::<String>();
            format!("<{}{}>", node.tag, attrs)
        }
        None => "<gone>".to_string(),
    };
    let mut tree = termtree::Tree::new(label);
    if let Some(node) = host.get(id) {
        for &child in &node.children {
            tree.push(render_termtree(host, child));
        }
    }
    tree
}

#[instrument(level = "debug")]
fn _types(with_properties: bool) -> Result<()> {
    for name in vocabulary::known_types() {
        if with_properties {
            let marker = if vocabulary::has_geo_property(name) {
                " [geo]"
            } else {
                ""
            };
            output::header(&format!("{}{}", name, marker));
            if let Some(props) = vocabulary::place_properties(name) {
                for prop in props {
                    output::detail(prop);
                }
            }
        } else {
            output::info(name);
        }
    }
    Ok(())
}

fn _config(command: &ConfigCommands, settings: &Settings) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match config::global_config_path() {
                Some(path) => output::info(&path.display()),
                None => output::warning("no config directory available"),
            }
            Ok(())
        }
        ConfigCommands::Init => {
            let path = config::global_config_path()
                .context("no config directory available on this platform")?;
            if path.exists() {
                output::warning(&format!("config already exists: {}", path.display()));
                return Ok(());
            }
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
            std::fs::write(&path, Settings::template())
                .with_context(|| format!("writing {}", path.display()))?;
            debug!(path = %path.display(), "created config template");
            output::action("Created", &path.display());
            Ok(())
        }
    }
}
