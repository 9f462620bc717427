// Résumé analysis: the upload handler, the provider-backed service, and the
// normalized response contract.

pub mod handlers;
pub mod models;
pub mod service;
