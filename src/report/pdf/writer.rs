use super::jpeg::JpegImage;
use super::layout::{DrawOp, FontFace, Page};
use super::metrics::to_win_ansi;
use super::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::errors::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const LOGO: &str = "Im1";

/// Serialize laid-out pages into a PDF file.
pub(crate) fn write(
    pages: &[Page],
    logo: Option<&JpegImage>,
    title: Option<&str>,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let mut resources = dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    };

    if let Some(logo) = logo {
        let mut image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(logo.width),
                "Height" => i64::from(logo.height),
                "ColorSpace" => logo.color_space(),
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            logo.data.clone(),
        );
        image.allows_compression = false;
        let image_id = doc.add_object(image);
        resources.set("XObject", dictionary! { LOGO => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: operations(page),
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Producer" => Object::string_literal(concat!("backoffice ", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(title) = title {
        info.set("Title", Object::string_literal(encode(title)));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// The standard fonts are declared with `WinAnsiEncoding`.
fn encode(text: &str) -> Vec<u8> {
    let text = to_win_ansi(text);
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(&text);
    bytes.into_owned()
}

fn color(operator: &str, [r, g, b]: [f32; 3]) -> Operation {
    Operation::new(operator, vec![r.into(), g.into(), b.into()])
}

fn operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(color("rg", *fill));
                ops.push(Operation::new(
                    "re",
                    vec![
                        (*x).into(),
                        (PAGE_HEIGHT - y - height).into(),
                        (*width).into(),
                        (*height).into(),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::Text {
                x,
                y,
                size,
                face,
                color: text_color,
                text,
            } => {
                let font = match face {
                    FontFace::Regular => REGULAR_FONT,
                    FontFace::Bold => BOLD_FONT,
                };
                ops.push(Operation::new("BT", vec![]));
                ops.push(color("rg", *text_color));
                ops.push(Operation::new("Tf", vec![font.into(), (*size).into()]));
                ops.push(Operation::new(
                    "Td",
                    vec![(*x).into(), (PAGE_HEIGHT - y).into()],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Logo {
                x,
                y,
                width,
                height,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        (*width).into(),
                        0_i64.into(),
                        0_i64.into(),
                        (*height).into(),
                        (*x).into(),
                        (PAGE_HEIGHT - y - height).into(),
                    ],
                ));
                ops.push(Operation::new("Do", vec![LOGO.into()]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}
