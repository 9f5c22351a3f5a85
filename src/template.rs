//! Filling a whole Word document: body, headers and footers

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, warn};

use crate::content::Content;
use crate::ooxml::names::w;
use crate::ooxml::{ImageStore, NodeId, OoxmlError, OpcPackage, WordDocument, XmlDocument};
use crate::options::FillOptions;
use crate::processors::{ContentProcessor, ProcessContext};
use crate::result::{FillError, ProcessResult};

/// Fills the content controls of a Word document.
///
/// ```rust,no_run
/// use docx_templater::{Content, FieldContent, TemplateProcessor};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut processor = TemplateProcessor::open("template.docx")?;
///     processor.set_remove_content_controls(true);
///     let result = processor.fill_content(&Content::new(vec![FieldContent::new("Name", "Ann").into()]));
///     println!("{}", result.to_json()?);
///     processor.save_to_file("filled.docx")?;
///     Ok(())
/// }
/// ```
pub struct TemplateProcessor {
    document: WordDocument,
    options: FillOptions,
}

impl TemplateProcessor {
    /// Work on loose trees. New images are kept in memory.
    pub fn new(document: XmlDocument, styles: Option<XmlDocument>, numbering: Option<XmlDocument>) -> Self {
        TemplateProcessor {
            document: WordDocument::from_parts(document, styles, numbering),
            options: FillOptions::default(),
        }
    }

    /// Open a .docx held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self, OoxmlError> {
        let document = WordDocument::parse(OpcPackage::new(data)?)?;
        Ok(TemplateProcessor {
            document,
            options: FillOptions::default(),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, OoxmlError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn set_remove_content_controls(&mut self, remove: bool) -> &mut Self {
        self.options.remove_content_controls = remove;
        self
    }

    pub fn set_notice_about_errors(&mut self, notice: bool) -> &mut Self {
        self.options.notice_about_errors = notice;
        self
    }

    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> FillOptions {
        self.options
    }

    /// Fill `content` into the body, then every footer, then every header.
    ///
    /// Each part is filled independently; the results are merged. With
    /// `notice_about_errors` on, the errors are also written at the top of
    /// the body.
    pub fn fill_content(&mut self, content: &Content) -> ProcessResult {
        let items = content.all();
        let remove = self.options.remove_content_controls;
        let WordDocument {
            main_part_name,
            main,
            styles,
            numbering,
            headers,
            footers,
            images,
        } = &mut self.document;
        let styles = styles.as_ref().map(|(_, tree)| tree);

        let mut result = ProcessResult::not_handled();

        match main.child(main.root(), w::BODY) {
            Some(body) => {
                let mut ctx = ProcessContext::new(
                    main_part_name.as_str(),
                    numbering.as_mut().map(|(_, tree)| tree),
                    styles,
                    &mut *images,
                    remove,
                );
                result.merge(ContentProcessor::fill_content(main, &mut ctx, body, &items));
            }
            None => warn!("{} has no body", main_part_name),
        }

        let parts = footers
            .iter_mut()
            .map(|(name, tree)| (name, tree, w::FOOTER))
            .chain(headers.iter_mut().map(|(name, tree)| (name, tree, w::HEADER)));
        for (name, tree, expected_root) in parts {
            let scope = tree.root();
            if !tree.is(scope, expected_root) {
                warn!("{} does not start with {}", name, expected_root);
            }
            let mut ctx = ProcessContext::new(
                name.as_str(),
                numbering.as_mut().map(|(_, tree)| tree),
                styles,
                &mut *images,
                remove,
            );
            result.merge(ContentProcessor::fill_content(tree, &mut ctx, scope, &items));
        }

        debug!(
            "fill finished: {} handled, {} error(s)",
            result.handled().len(),
            result.errors().len()
        );

        if self.options.notice_about_errors && !result.success() {
            add_errors(main, result.errors());
        }
        result
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document.main
    }

    pub fn styles(&self) -> Option<&XmlDocument> {
        self.document.styles.as_ref().map(|(_, tree)| tree)
    }

    pub fn numbering(&self) -> Option<&XmlDocument> {
        self.document.numbering.as_ref().map(|(_, tree)| tree)
    }

    pub fn headers(&self) -> &BTreeMap<String, XmlDocument> {
        &self.document.headers
    }

    pub fn footers(&self) -> &BTreeMap<String, XmlDocument> {
        &self.document.footers
    }

    pub fn images(&self) -> &ImageStore {
        &self.document.images
    }

    /// Serialize the filled document as .docx bytes
    pub fn save_changes(&mut self) -> Result<Vec<u8>, OoxmlError> {
        self.document.save_changes()
    }

    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), OoxmlError> {
        let data = self.save_changes()?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Prepend one red-on-yellow paragraph per error to the body
fn add_errors(main: &mut XmlDocument, errors: &[FillError]) {
    let Some(body) = main.child(main.root(), w::BODY) else {
        return;
    };
    for (index, error) in errors.iter().enumerate() {
        let paragraph = error_paragraph(main, &error.to_string());
        main.insert_child(body, index, paragraph);
    }
}

fn error_paragraph(doc: &mut XmlDocument, message: &str) -> NodeId {
    let properties = doc.create_element(w::R_PR);
    for (name, value) in [(w::COLOR, "red"), (w::SZ, "28"), (w::SZ_CS, "28"), (w::HIGHLIGHT, "yellow")] {
        let property = doc.create_element_with(name, &[(w::VAL, value)]);
        doc.append_child(properties, property);
    }

    let text = doc.create_element(w::T);
    doc.set_text(text, message);

    let run = doc.create_element(w::R);
    doc.append_child(run, properties);
    doc.append_child(run, text);

    let paragraph = doc.create_element(w::P);
    doc.append_child(paragraph, run);
    paragraph
}
