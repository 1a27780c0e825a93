use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A serviced client. `area` keys into the waste-pickup schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub area: String,
    pub avatar: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn new(name: String, phone: String, address: String, area: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            phone,
            address,
            area,
            avatar: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn update(&mut self, update: ClientUpdateInput) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(area) = update.area {
            self.area = area;
        }
        if let Some(avatar) = update.avatar {
            self.avatar = avatar;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for updating a client record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdateInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub area: Option<String>,
    pub avatar: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}
