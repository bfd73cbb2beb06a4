use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Activity types a venue can host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Football,
    Cricket,
    Badminton,
    Tennis,
    Basketball,
    Volleyball,
}

/// A bookable venue, owned by exactly one OWNER account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    /// Price per slot in minor currency units, unless a slot overrides it
    pub base_price: i32,
    pub activities: Vec<ActivityType>,
    pub created_at: DateTime<Utc>,
}

impl Venue {
    pub fn new(
        owner_id: Uuid,
        name: String,
        location: String,
        description: Option<String>,
        base_price: i32,
        activities: Vec<ActivityType>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            location,
            description,
            base_price,
            activities,
            created_at: Utc::now(),
        }
    }
}

/// In-memory venue registry shared across request handlers
pub struct VenueDirectory {
    venues: RwLock<HashMap<Uuid, Venue>>,
}

impl VenueDirectory {
    pub fn new() -> Self {
        Self {
            venues: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new venue
    pub fn register(&self, venue: Venue) -> Venue {
        let mut venues = self.venues.write().unwrap();
        venues.insert(venue.id, venue.clone());
        venue
    }

    /// Get a venue by ID
    pub fn get(&self, venue_id: &Uuid) -> Option<Venue> {
        self.venues.read().unwrap().get(venue_id).cloned()
    }

    /// List venues, optionally filtered by a case-insensitive location substring
    pub fn list(&self, location: Option<&str>) -> Vec<Venue> {
        let venues = self.venues.read().unwrap();
        let mut result: Vec<Venue> = venues
            .values()
            .filter(|v| match location {
                Some(needle) => v.location.to_lowercase().contains(&needle.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// List venues belonging to one owner
    pub fn owned_by(&self, owner_id: &Uuid) -> Vec<Venue> {
        let venues = self.venues.read().unwrap();
        let mut result: Vec<Venue> = venues
            .values()
            .filter(|v| v.owner_id == *owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Apply an administrative edit and return the updated venue
    pub fn update<F>(&self, venue_id: &Uuid, f: F) -> Result<Venue, VenueError>
    where
        F: FnOnce(&mut Venue),
    {
        let mut venues = self.venues.write().unwrap();
        let venue = venues
            .get_mut(venue_id)
            .ok_or(VenueError::NotFound(*venue_id))?;

        f(venue);
        Ok(venue.clone())
    }
}

impl Default for VenueDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VenueError {
    #[error("Venue not found: {0}")]
    NotFound(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_venue(name: &str, location: &str) -> Venue {
        Venue::new(
            Uuid::new_v4(),
            name.to_string(),
            location.to_string(),
            None,
            50000,
            vec![ActivityType::Football],
        )
    }

    #[test]
    fn test_register_and_get() {
        let directory = VenueDirectory::new();
        let venue = directory.register(sample_venue("City Arena", "Chennai"));

        let fetched = directory.get(&venue.id).unwrap();
        assert_eq!(fetched.name, "City Arena");
        assert_eq!(fetched.base_price, 50000);
    }

    #[test]
    fn test_location_filter_is_case_insensitive() {
        let directory = VenueDirectory::new();
        directory.register(sample_venue("North Turf", "Mumbai"));
        directory.register(sample_venue("South Turf", "Chennai"));

        let hits = directory.list(Some("chen"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "South Turf");

        assert_eq!(directory.list(None).len(), 2);
    }

    #[test]
    fn test_update_unknown_venue() {
        let directory = VenueDirectory::new();
        let result = directory.update(&Uuid::new_v4(), |v| v.base_price = 1);
        assert!(matches!(result, Err(VenueError::NotFound(_))));
    }
}
