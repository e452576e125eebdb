use serde::Deserialize;

#[derive(Deserialize)]
pub struct AccessForm {
    pub access_code: String,
    pub csrf_token: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct AccessQuery {
    #[serde(default)]
    pub next: Option<String>,
}
