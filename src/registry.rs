// Registry service - validate, allocate, append, render
//
// Front ends (terminal UI, CLI, HTTP API) talk to this type only; it owns the
// store handle and the renderer and holds no other state.

use crate::config::Config;
use crate::error::{Error, Result, ValidationError};
use crate::identifier;
use crate::record::{Registration, RegistrationForm};
use crate::render::{DocumentRenderer, PdfRenderer};
use crate::store::RecordStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub record: Registration,
    pub document: PathBuf,
}

pub struct Registry {
    store: RecordStore,
    renderer: Box<dyn DocumentRenderer>,
    output_dir: PathBuf,
}

impl Registry {
    pub fn new(
        store: RecordStore,
        renderer: Box<dyn DocumentRenderer>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            renderer,
            output_dir: output_dir.into(),
        }
    }

    /// Registry with the PDF renderer, wired from configuration
    pub fn from_config(config: &Config) -> Self {
        let renderer = PdfRenderer::new(
            config.institution.name.clone(),
            Some(config.institution.logo_path.clone()),
        );
        Self::new(
            RecordStore::open(config.registrations_path()),
            Box::new(renderer),
            config.output_dir(),
        )
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn next_identifier(&self) -> Result<String> {
        identifier::next_identifier(&self.store)
    }

    /// Validate the form, store it under the next identifier, render its document
    ///
    /// Nothing is written when validation or allocation fails. A rendering
    /// failure is reported after the record has been stored.
    pub fn submit(&self, form: &RegistrationForm) -> Result<Submission> {
        form.validate()?;

        if !form.dob_is_well_formed() {
            warn!(dob = %form.dob, "date of birth is not in DD-MM-YYYY form");
        }

        let id = self.next_identifier()?;
        let record = form.clone().into_registration(id);
        self.store.append(&record)?;

        let document = self.render_document(&record)?;
        info!(id = %record.id, "registration submitted");

        Ok(Submission { record, document })
    }

    /// Look a registration up by identifier or mobile number
    pub fn lookup(&self, key: &str) -> Result<Registration> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::missing(vec!["Registration No or Mobile"]).into());
        }

        self.store
            .find(key)?
            .ok_or_else(|| Error::not_found(key))
    }

    /// Render (or re-render) the document for a stored registration
    pub fn render_document(&self, record: &Registration) -> Result<PathBuf> {
        self.renderer
            .render(record, record.photo_path(), &self.output_dir)
    }

    pub fn records(&self) -> Result<Vec<Registration>> {
        self.store.all()
    }
}
