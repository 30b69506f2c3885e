#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;

use mailmerge_docx::{Stories, TemplatePackage};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_DOC: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

pub fn build_zip(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Copy of the zip `bytes` with the entry `name` replaced by `body`.
pub fn replace_entry(bytes: &[u8], name: &str, body: &[u8]) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        let entry_name = file.name().to_string();
        if entry_name == name {
            data = body.to_vec();
        }
        entries.push((entry_name, data));
    }
    build_zip(&entries)
}

/// A workbook whose sheets are given as rows of inline strings, keyed by 1-based row number.
/// Empty strings produce no cell.
pub fn workbook(sheets: &[(&str, &[(u32, &[&str])])]) -> Vec<u8> {
    let mut entries = vec![(
        "_rels/.rels".to_string(),
        format!(
            r#"<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{OFFICE_DOC}" Target="xl/workbook.xml"/></Relationships>"#
        )
        .into_bytes(),
    )];
    let mut sheet_list = String::new();
    let mut rels = String::new();
    for (i, (name, rows)) in sheets.iter().enumerate() {
        let n = i + 1;
        sheet_list.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{WORKSHEET}" Target="worksheets/sheet{n}.xml"/>"#
        ));

        let mut data = String::new();
        for (row, values) in rows.iter() {
            data.push_str(&format!(r#"<row r="{row}">"#));
            for (col, value) in values.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let col = (b'A' + col as u8) as char;
                data.push_str(&format!(
                    r#"<c r="{col}{row}" t="inlineStr"><is><t>{value}</t></is></c>"#
                ));
            }
            data.push_str("</row>");
        }
        entries.push((
            format!("xl/worksheets/sheet{n}.xml"),
            format!(
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
            )
            .into_bytes(),
        ));
    }
    entries.push((
        "xl/workbook.xml".to_string(),
        format!(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_list}</sheets></workbook>"#
        )
        .into_bytes(),
    ));
    entries.push((
        "xl/_rels/workbook.xml.rels".to_string(),
        format!(r#"<Relationships xmlns="{REL_NS}">{rels}</Relationships>"#).into_bytes(),
    ));
    build_zip(&entries)
}

pub fn customers_workbook() -> Vec<u8> {
    workbook(&[
        (
            "North",
            &[
                (1, &["Customer list"]),
                (4, &["Name", "Address", "City"]),
                (5, &["Alice", "1 Main St", "Springfield"]),
                (6, &["Bob", "", "Shelbyville"]),
                (7, &["", "X", "Ogdenville"]),
                (8, &["Carol", "2 Side Rd", ""]),
            ],
        ),
        (
            "South",
            &[
                (4, &["Name", "Address", "City"]),
                (5, &["Dave", "9 Elm", "Capital City"]),
            ],
        ),
    ])
}

pub fn template(body: &str) -> Vec<u8> {
    build_zip(&[
        (
            "[Content_Types].xml".to_string(),
            br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#
                .to_vec(),
        ),
        (
            "_rels/.rels".to_string(),
            format!(
                r#"<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{OFFICE_DOC}" Target="word/document.xml"/></Relationships>"#
            )
            .into_bytes(),
        ),
        (
            "word/document.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
            )
            .into_bytes(),
        ),
    ])
}

pub fn letter_template() -> Vec<u8> {
    template(concat!(
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Dear </w:t></w:r><w:r><w:t>{Name}, we wrote to {Address}.</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>City: {City}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
    ))
}

pub fn paragraph_texts(docx: &Path) -> Vec<String> {
    let bytes = std::fs::read(docx).unwrap();
    TemplatePackage::from_bytes(&bytes)
        .unwrap()
        .instantiate(Stories::Body)
        .unwrap()
        .paragraph_texts()
        .unwrap()
}

pub fn file_names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}
