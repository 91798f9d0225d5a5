// handlers/mod.rs - request handlers grouped by concern
//
// `resource` and `junction` are generic over the static registry; the rest
// cover endpoints that touch several tables or speak something other than
// plain JSON.
pub mod activities; // POST/PUT /api/activities with milestone links
pub mod files; // multipart photo/attachment uploads
pub mod junction; // /api/:owner/:id/:segment[/:target_id]
pub mod maps; // GeoJSON aggregation with bounding box
pub mod planning; // CIDP import, template download, PDF exports
pub mod projects; // project list filters and composite create/update
pub mod resource; // generic CRUD, child listings and find
pub mod system; // service info and health
