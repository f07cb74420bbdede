use std::time::Instant;

use tracing::{info, warn};

use crate::catalog::ResourceCatalog;
use crate::config::LinkerConfig;
use crate::errors::{DsnLinksError, Result};
use crate::extraction::{recognizer_for, ScriptRecognizer};
use crate::host::HostGraph;
use crate::types::*;

/// Families in the order they are processed.
const FAMILIES: [CommandFamily; 2] = [CommandFamily::Transfer, CommandFamily::ParameterSend];

/// Central orchestrator: finds job steps calling FTP or CDSEND, scans the
/// script attached to each call, and writes dataset access links back to
/// the host.
pub struct DatasetLinker<'a, H: HostGraph + ?Sized> {
    host: &'a mut H,
    config: LinkerConfig,
}

impl<'a, H: HostGraph + ?Sized> DatasetLinker<'a, H> {
    pub fn new(host: &'a mut H, config: LinkerConfig) -> Self {
        Self { host, config }
    }

    /// Runs one extraction over the host graph.
    ///
    /// Host query failures abort the run. A failure while processing a
    /// single call link is recorded in the report and the run moves on.
    pub fn run(&mut self) -> Result<ExtractionReport> {
        let start = Instant::now();
        let mut report = ExtractionReport::default();

        let container = self.find_container()?;
        match &container {
            Some(id) => info!(container = %id, "placeholder datasets go to container"),
            None => info!("no dataset container; placeholders go to their step"),
        }
        let mut catalog = ResourceCatalog::new(&self.config, container);

        for family in FAMILIES {
            self.link_family(family, &mut catalog, &mut report)?;
        }
        report.placeholders_created = catalog.placeholders_created();

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            links = report.links_scanned,
            edges = report.edges_created,
            placeholders = report.placeholders_created,
            failures = report.failures.len(),
            duration_ms,
            "extraction complete"
        );
        Ok(report)
    }

    /// Returns the folder that owns placeholder datasets, if the host has one.
    fn find_container(&self) -> Result<Option<ObjectId>> {
        let candidates = self
            .host
            .objects_of_types(std::slice::from_ref(&self.config.container_type))?;
        Ok(candidates
            .into_iter()
            .find(|o| o.name == self.config.container_name)
            .map(|o| o.id))
    }

    fn link_family(
        &mut self,
        family: CommandFamily,
        catalog: &mut ResourceCatalog,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        info!(family = family.as_str(), "scanning JCL");
        let settings = self.config.family(family);

        let landmarks: Vec<ObjectId> = self
            .host
            .objects_of_types(&settings.landmark_types)?
            .into_iter()
            .filter(|o| settings.is_landmark(&o.name))
            .map(|o| o.id)
            .collect();
        if landmarks.is_empty() {
            info!(family = family.as_str(), "no usage");
            return Ok(());
        }
        report.landmarks += landmarks.len();

        let links = self.host.call_links(&self.config.step_type, &landmarks)?;
        if links.is_empty() {
            info!(family = family.as_str(), "no calls from job steps");
            return Ok(());
        }

        // Only pay for the dataset load when the idiom is actually used.
        catalog.load(&*self.host)?;

        let recognizer = recognizer_for(family, &self.config);
        let failures = for_each_isolated(&links, |link| {
            if link.positions.is_empty() {
                report.links_skipped += 1;
                return Ok(());
            }
            report.links_scanned += 1;
            self.link_one(recognizer.as_ref(), catalog, link, report)
        });

        for (link, err) in failures {
            warn!(family = family.as_str(), link = %link.describe(), error = %err, "link extraction failed");
            report.failures.push(LinkFailure {
                family,
                caller: link.caller.name.clone(),
                callee: link.callee.name.clone(),
                message: err.to_string(),
            });
        }
        Ok(())
    }

    /// Scans the script of one call link and writes one edge per reference.
    fn link_one(
        &mut self,
        recognizer: &dyn ScriptRecognizer,
        catalog: &mut ResourceCatalog,
        link: &CallLink,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let block = link
            .positions
            .first()
            .and_then(ScriptBlock::from_position)
            .ok_or_else(|| DsnLinksError::MissingScript {
                link: link.describe(),
            })?;

        for reference in recognizer.scan(&block) {
            report.references += 1;
            let dataset = catalog.resolve_or_create(&mut *self.host, &reference.name, &link.caller)?;
            let edge = ReferenceEdge {
                kind: reference.access,
                source: link.caller.id.clone(),
                target: dataset.id,
                bookmark: block.bookmark(&reference.span),
            };
            info!(
                dataset = %reference.name,
                kind = edge.kind.as_str(),
                line = edge.bookmark.begin_line,
                "creating link"
            );
            self.host.create_link(&edge)?;
            report.edges_created += 1;
        }
        Ok(())
    }
}

/// Applies `f` to every item, collecting failures instead of stopping at
/// the first one.
fn for_each_isolated<'i, T, F>(items: &'i [T], mut f: F) -> Vec<(&'i T, DsnLinksError)>
where
    F: FnMut(&'i T) -> Result<()>,
{
    items
        .iter()
        .filter_map(|item| f(item).err().map(|err| (item, err)))
        .collect()
}
