//! HTTP request handlers, one module per surface (see `crate::server::routes`).

mod catalog;
mod dto;
mod ingest;
mod processor;

pub use catalog::{
    get_file, get_record, get_record_pdf, list_record_pages, list_records, record_events,
    search_records,
};
pub use ingest::{
    attach_page, attach_pdf, attach_text_pdf, complete_ingest, delete_record, ingest_status,
    repair_record, upsert_record,
};
pub use processor::{
    claim_job, complete_job, fail_job, job_events, page_image, post_entities, post_ocr_artifact,
    post_ocr_text, post_searchable_pdf,
};
