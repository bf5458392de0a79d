use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextNumberQuery {
    pub transportadora_id: Option<String>,
    pub codigo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextNumberResponse {
    pub next_number: String,
}
