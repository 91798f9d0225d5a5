use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::layout::{BOLD, PAGE_HEIGHT, PAGE_WIDTH, REGULAR};
use super::ReportError;

/// Assemble laid-out pages into a PDF file.
pub fn render(pages: Vec<Vec<Operation>>, title: &str) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(PAGE_WIDTH), Object::Real(PAGE_HEIGHT)],
        }),
    );

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
        "Producer" => Object::string_literal(concat!("pmis-api ", env!("CARGO_PKG_VERSION"))),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}
