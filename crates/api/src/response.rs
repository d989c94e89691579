use serde::Serialize;

/// `{ "data": T }` envelope for project and generator responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
