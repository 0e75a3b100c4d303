#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use regrag_core::traits::{Capability, Embedder};
use regrag_embed::HashEmbedder;

pub const DIM: usize = 128;

pub fn hash_embedder() -> Capability<Arc<dyn Embedder>> {
    Capability::Available(Arc::new(HashEmbedder::new(DIM)))
}

/// A small corpus: two sources under `data/`, one at the root, one missing, one empty.
pub fn write_corpus(root: &Path) {
    std::fs::create_dir_all(root.join("data/sources")).expect("mkdir");
    let employment = "Employment Regulations 2024. Working hours: an employer shall not require an employee \
        to work more than forty eight hours in each seven day period. Rest breaks and overtime pay apply. "
        .repeat(6);
    std::fs::write(root.join("data/sources/employment_regulations_2024.txt"), employment).expect("write");
    std::fs::write(
        root.join("data/sources/companies.html"),
        "<html><body><h1>Companies Regulations 2020</h1><p>The articles of association must be contained \
         in a single document and divided into paragraphs numbered consecutively.</p>\
         <p>A company shall keep a register of members and a register of directors.</p></body></html>",
    )
    .expect("write");
    std::fs::write(
        root.join("jurisdiction.md"),
        "Model clause: this agreement is governed by the laws of the Abu Dhabi Global Market and the ADGM Courts.",
    )
    .expect("write");
    std::fs::write(root.join("data/sources/empty.txt"), "   \n ").expect("write");
    std::fs::write(root.join("data/sources/unlisted.pdf"), b"%PDF-").expect("write");

    let manifest = serde_json::json!({
        "sources": [
            {"id": "employment_regulations_2024", "title": "Employment Regulations 2024", "type": "regulation",
             "path": "sources/employment_regulations_2024.txt", "citation": "ADGM Employment Regulations 2024",
             "scope": ["Employment Contracts"]},
            {"id": "companies_regulations_2020", "title": "Companies Regulations 2020", "type": "regulation",
             "path": "sources/companies.html", "citation": "ADGM Companies Regulations 2020, Art. 16",
             "scope": ["AoA", "Company Incorporation"]},
            {"id": "jurisdiction_clause", "title": "Model jurisdiction clause", "type": "template",
             "path": "jurisdiction.md", "citation": "ADGM Courts model clause",
             "scope": ["Jurisdiction/Choice-of-Law"]},
            {"id": "missing_guidance", "title": "Missing guidance", "type": "guidance",
             "path": "sources/missing.pdf", "citation": "", "scope": []},
            {"id": "empty_notice", "title": "Empty notice", "type": "guidance",
             "path": "sources/empty.txt"}
        ]
    });
    std::fs::write(root.join("data/sources_manifest.json"), manifest.to_string()).expect("write");
}
