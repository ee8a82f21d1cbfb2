//! Profile-driven installer

use super::layout;
use super::{IdeInstaller, InstallOptions, InstallReport};
use crate::artifact::{discover, SourceArtifact};
use crate::error::{InstallError, InstallResult};
use crate::hooks::damage_control;
use crate::transform::Transformer;
use crate::util::{atomic_write, safe_join};
use agileflow_profiles::{
    ArtifactKind, CapabilityProfile, CommandLayout, ProfileLoader, CANONICAL_PROFILE_ID,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source sub-directories holding canonical artifacts
const COMMANDS_DIR: &str = "commands";
const AGENTS_DIR: &str = "agents";

/// Installer for any target described by a capability profile
#[derive(Debug, Clone)]
pub struct ProfileInstaller {
    transformer: Transformer,
}

impl ProfileInstaller {
    pub fn new(
        source: Arc<CapabilityProfile>,
        target: Arc<CapabilityProfile>,
    ) -> InstallResult<Self> {
        Ok(Self {
            transformer: Transformer::new(source, target)?,
        })
    }

    /// Installer from the canonical profile to `id`
    pub fn for_target(loader: &ProfileLoader, id: &str) -> InstallResult<Self> {
        let source = loader.load(CANONICAL_PROFILE_ID)?;
        let target = loader.load(id)?;
        Self::new(source, target)
    }

    pub fn profile(&self) -> &CapabilityProfile {
        self.transformer.target()
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    fn run(
        &self,
        root: &Path,
        source_dir: &Path,
        options: &InstallOptions,
        report: &mut InstallReport,
    ) -> InstallResult<()> {
        let profile = self.profile();
        let ide = profile.id();

        tracing::info!(ide, "cleaning up previous install");
        let removed = layout::cleanup(root, profile)?;
        tracing::debug!(ide, removed, "cleanup done");

        let mut writer = ArtifactWriter::new(root);

        tracing::info!(ide, "writing commands");
        if let Some(commands) = read_sources(source_dir, COMMANDS_DIR, ArtifactKind::Command, report)? {
            self.write_commands(&commands, &mut writer, report)?;
        }

        tracing::info!(ide, "writing agents");
        if let Some(agents) = read_sources(source_dir, AGENTS_DIR, ArtifactKind::Agent, report)? {
            self.write_agents(&agents, &mut writer, report)?;
        }

        if options.skip_damage_control {
            tracing::debug!(ide, "damage control skipped by option");
        } else {
            tracing::info!(ide, "wiring damage control");
            let wiring = damage_control::install(root, source_dir, profile)?;
            report.hooks = wiring.hooks;
            report.warnings.extend(wiring.warnings);
        }

        tracing::info!(
            ide,
            commands = report.commands,
            agents = report.agents,
            skills = report.skills,
            hooks = report.hooks,
            "install complete"
        );
        Ok(())
    }

    fn write_commands(
        &self,
        commands: &[SourceArtifact],
        writer: &mut ArtifactWriter<'_>,
        report: &mut InstallReport,
    ) -> InstallResult<()> {
        let profile = self.profile();
        if profile.paths.commands.is_none() {
            report.warn(format!("{} has no commands directory", profile.display_name()));
            return Ok(());
        }

        let kind = if profile.layout.commands == CommandLayout::Skill {
            ArtifactKind::Skill
        } else {
            ArtifactKind::Command
        };

        for command in commands {
            let Some(rel) = layout::command_path(profile, command) else {
                continue;
            };
            if self.emit(command, kind, &rel, writer, report)? {
                report.commands += 1;
            }
        }
        Ok(())
    }

    fn write_agents(
        &self,
        agents: &[SourceArtifact],
        writer: &mut ArtifactWriter<'_>,
        report: &mut InstallReport,
    ) -> InstallResult<()> {
        let profile = self.profile();

        for agent in agents {
            if let Some(rel) = layout::agent_path(profile, agent) {
                if self.emit(agent, ArtifactKind::Agent, &rel, writer, report)? {
                    report.agents += 1;
                }
            }
            // Skills are a second pass over the same source, not a copy of
            // the agent output
            if let Some(rel) = layout::skill_path(profile, agent) {
                if self.emit(agent, ArtifactKind::Skill, &rel, writer, report)? {
                    report.skills += 1;
                }
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        artifact: &SourceArtifact,
        kind: ArtifactKind,
        rel: &Path,
        writer: &mut ArtifactWriter<'_>,
        report: &mut InstallReport,
    ) -> InstallResult<bool> {
        let transformed = self.transformer.transform(artifact, kind);
        for warning in &transformed.warnings {
            report.warn(format!("{}: {warning}", rel.display()));
        }
        writer.write(rel, &transformed.content, report)
    }
}

impl IdeInstaller for ProfileInstaller {
    fn ide(&self) -> &str {
        self.profile().id()
    }

    fn detect(&self, root: &Path) -> bool {
        safe_join(root, Path::new(self.profile().config_dir())).is_ok_and(|dir| dir.is_dir())
    }

    fn cleanup(&self, root: &Path) -> InstallResult<()> {
        layout::cleanup(root, self.profile()).map(|_| ())
    }

    fn setup(&self, root: &Path, source_dir: &Path, options: &InstallOptions) -> InstallReport {
        let mut report = InstallReport::new(self.ide());
        if self.detect(root) {
            tracing::debug!(ide = self.ide(), "existing configuration detected");
        }

        if let Err(e) = self.run(root, source_dir, options, &mut report) {
            tracing::error!(ide = self.ide(), error = %e, "install failed");
            report.fail(&e);
        }
        report
    }

    fn uninstall(&self, root: &Path) -> InstallResult<()> {
        self.cleanup(root)?;
        damage_control::uninstall(root, self.profile())
    }
}

/// Read one source sub-directory. A missing directory is a warning, not an
/// error.
fn read_sources(
    source_dir: &Path,
    name: &str,
    kind: ArtifactKind,
    report: &mut InstallReport,
) -> InstallResult<Option<Vec<SourceArtifact>>> {
    let dir = source_dir.join(name);
    if !dir.is_dir() {
        report.warn(format!("no {name} directory at {}", dir.display()));
        return Ok(None);
    }
    let found = discover(&dir, kind)?;
    for message in found.skipped {
        report.warn(message);
    }
    Ok(Some(found.artifacts))
}

/// Writes artifacts atomically and refuses to write one path twice per run
struct ArtifactWriter<'a> {
    root: &'a Path,
    written: HashSet<PathBuf>,
}

impl<'a> ArtifactWriter<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            written: HashSet::new(),
        }
    }

    fn write(&mut self, rel: &Path, content: &str, report: &mut InstallReport) -> InstallResult<bool> {
        let path = safe_join(self.root, rel)?;
        if !self.written.insert(path.clone()) {
            report.warn(format!(
                "{} would be written twice; kept the first",
                rel.display()
            ));
            return Ok(false);
        }

        atomic_write(&path, content.as_bytes()).map_err(|e| InstallError::io(&path, &e))?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(true)
    }
}
