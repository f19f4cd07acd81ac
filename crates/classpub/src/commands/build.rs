//! `classpub build` - compose one section's site inputs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use classpub_compose::{ComposeOptions, ComposeWarning, Composition, compose};
use classpub_config::{CliSettings, Config, ExplorerConfig};
use classpub_content::{ContentRecord, SectionId};
use classpub_explorer::{
    ExplorerOptions, ExplorerTree, FileStateStore, FilterStrategy, FolderNode, ListItem,
    ListingOptions, MapStrategy, Navigation, NullStateStore, PipelineStep, StateStore, TrieNode,
    UnknownName, list, listing_enabled,
};
use classpub_store::{FsSource, RecordSource, StoreErrorKind};

use crate::error::CliError;
use crate::output::Output;

/// Compose and emit a section's site inputs.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Course code (defaults to the configured course).
    #[arg(long)]
    pub course: Option<String>,

    /// Section number to build (1-based).
    #[arg(long)]
    pub section: u32,

    /// Path to classpub.toml (searched upward from the current directory
    /// when omitted).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the content source directory.
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Override the build output directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Generate social media preview images in the render step.
    #[arg(long)]
    pub social_previews: bool,

    /// Force dependency reinstall in the render step.
    #[arg(long)]
    pub reinstall: bool,

    /// Clear the section's output directory before writing.
    #[arg(long)]
    pub reset: bool,

    /// Ignore saved explorer state; every folder falls back to its default.
    #[arg(long)]
    pub reselect_hidden: bool,

    /// Enable verbose logging.
    #[arg(long)]
    pub verbose: bool,
}

/// A folder index page listing, keyed by folder path.
#[derive(Serialize)]
struct FolderListing {
    path: String,
    title: String,
    items: Vec<ListItem>,
}

/// Build manifest recorded for the downstream renderer.
#[derive(Serialize)]
struct Manifest<'a> {
    course: &'a str,
    section: u32,
    generated_at: DateTime<Utc>,
    social_previews: bool,
    reinstall: bool,
    warnings: &'a [ComposeWarning],
}

impl BuildArgs {
    /// Run the build.
    pub(crate) fn execute(&self, output: &Output) -> Result<(), CliError> {
        let settings = CliSettings {
            course_code: self.course.clone(),
            source_dir: self.source_dir.clone(),
            output_dir: self.output_dir.clone(),
            social_previews: self.social_previews.then_some(true),
            reinstall: self.reinstall.then_some(true),
            use_saved_state: self.reselect_hidden.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        config.validate()?;
        config.require_section(self.section)?;

        let section = SectionId(self.section);
        let now = Utc::now();

        output.highlight(&format!(
            "Building {} {section}",
            config.course.code.to_uppercase()
        ));

        let shared = self.scan_shared(&config, output);
        let section_records = self.scan_section(&config, section, output);

        let composition = compose(
            shared,
            section_records,
            section,
            &ComposeOptions {
                reference_time: now,
            },
        );
        for warning in &composition.warnings {
            output.warning(&format!("Skipped '{}': {}", warning.title, warning.reason));
        }
        output.info(&format!(
            "Composed {} record(s) for {section}",
            composition.records.len()
        ));

        let options = explorer_options(&config.explorer, output);
        let use_saved_state = options.use_saved_state;
        let default_state = options.folder_default_state;
        let tree = ExplorerTree::build(composition.records.clone(), options, now);

        // Saved collapse state lives under one key; reconcile it against
        // the fresh tree and write the result back
        let store: Box<dyn StateStore> = if use_saved_state {
            Box::new(FileStateStore::new(config.content_resolved.state_file()))
        } else {
            Box::new(NullStateStore)
        };
        let state = store.load().reconcile(tree.folder_paths(), default_state);
        store.save(&state);

        let navigation = tree.navigation(&state, None);

        let mut listings = Vec::new();
        collect_listings(tree.trie().root(), &mut listings);

        self.write_artifacts(&config, section, now, &composition, &navigation, &listings)?;

        output.success(&format!(
            "Wrote {} to {}",
            section,
            config
                .content_resolved
                .output_dir
                .join(section.dir_name())
                .display()
        ));
        Ok(())
    }

    /// Scan shared folders and files. Missing sources warn, never fail.
    fn scan_shared(&self, config: &Config, output: &Output) -> Vec<ContentRecord> {
        let content = &config.content_resolved;
        let mut records = Vec::new();

        for dir in &content.shared_dirs {
            let source = FsSource::with_prefix(content.source_dir.join(dir), dir);
            match source.scan() {
                Ok(found) => records.extend(found),
                Err(e) => output.warning(&format!("Could not scan shared folder '{dir}': {e}")),
            }
        }

        let course_source = FsSource::new(content.source_dir.clone());
        for file in &content.shared_files {
            match course_source.read_record(Path::new(file)) {
                Ok(record) => records.push(record),
                Err(e) => output.warning(&format!("Could not read shared file '{file}': {e}")),
            }
        }

        records
    }

    /// Scan the section's own folders and files, starting with its index.
    fn scan_section(
        &self,
        config: &Config,
        section: SectionId,
        output: &Output,
    ) -> Vec<ContentRecord> {
        let content = &config.content_resolved;
        let section_dir = content.source_dir.join(section.dir_name());
        let section_source = FsSource::new(section_dir.clone());
        let mut records = Vec::new();

        match section_source.read_record(Path::new("index.md")) {
            Ok(record) => records.push(record),
            Err(e) if e.kind == StoreErrorKind::NotFound => {
                output.warning("Section index.md not found - site may not render correctly");
            }
            Err(e) => output.warning(&format!("Could not read section index.md: {e}")),
        }

        for dir in &content.section_dirs {
            let source = FsSource::with_prefix(section_dir.join(dir), dir);
            match source.scan() {
                Ok(found) => records.extend(found),
                Err(e) => output.warning(&format!("Could not scan section folder '{dir}': {e}")),
            }
        }

        for file in &content.section_files {
            match section_source.read_record(Path::new(file)) {
                Ok(record) => records.push(record),
                Err(e) => output.warning(&format!("Could not read section file '{file}': {e}")),
            }
        }

        records
    }

    /// Write the composed artifacts for the renderer collaborator.
    fn write_artifacts(
        &self,
        config: &Config,
        section: SectionId,
        now: DateTime<Utc>,
        composition: &Composition,
        navigation: &Navigation,
        listings: &[FolderListing],
    ) -> Result<(), CliError> {
        let out_dir = config
            .content_resolved
            .output_dir
            .join(section.dir_name());

        if self.reset && out_dir.exists() {
            fs::remove_dir_all(&out_dir)?;
        }
        fs::create_dir_all(&out_dir)?;

        let manifest = Manifest {
            course: &config.course.code,
            section: section.number(),
            generated_at: now,
            social_previews: config.build.social_previews,
            reinstall: config.build.reinstall,
            warnings: &composition.warnings,
        };

        write_json(&out_dir.join("records.json"), &composition.records)?;
        write_json(&out_dir.join("navigation.json"), navigation)?;
        write_json(&out_dir.join("listings.json"), &listings)?;
        write_json(&out_dir.join("manifest.json"), &manifest)?;

        Ok(())
    }
}

/// Resolve explorer configuration strings into typed options.
///
/// Unknown pipeline step names are reported and skipped.
fn explorer_options(config: &ExplorerConfig, output: &Output) -> ExplorerOptions {
    let order: Vec<PipelineStep> = config
        .pipeline_order
        .iter()
        .filter_map(|name| match name.parse() {
            Ok(step) => Some(step),
            Err(UnknownName(unknown)) => {
                output.warning(&format!("Ignoring unknown pipeline step '{unknown}'"));
                None
            }
        })
        .collect();

    let filter = (!config.hidden.is_empty())
        .then(|| FilterStrategy::HideTitles(config.hidden.iter().cloned().collect()));

    ExplorerOptions {
        order,
        filter,
        map: config
            .titleize_folders
            .then_some(MapStrategy::TitleizeFolders),
        sort: config.sort.parse().ok(),
        expandable: config.expandable.clone(),
        folder_default_state: config.folder_default_state.parse().unwrap_or_default(),
        folder_click_behavior: config.folder_click_behavior.parse().unwrap_or_default(),
        use_saved_state: config.use_saved_state,
    }
}

/// Collect index page listings for every folder that renders one.
fn collect_listings(folder: &FolderNode, out: &mut Vec<FolderListing>) {
    for child in &folder.children {
        if let TrieNode::Folder(sub) = child {
            if listing_enabled(sub) {
                out.push(FolderListing {
                    path: sub.path.clone(),
                    title: sub.display_name().to_owned(),
                    items: list(sub, &ListingOptions::default()),
                });
            }
            collect_listings(sub, out);
        }
    }
}

/// Serialize a value as pretty JSON to a file.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}
