use rust_decimal::Decimal;
use serde::Serialize;

use super::{Portal, PortalError, Session};
use crate::db::PortalRepository;
use crate::models::{ServiceRequest, StatusBucket, UserRole};

/// Headline numbers for the session's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_requests: usize,
    pub pending_requests: usize,
    pub active_requests: usize,
    pub completed_requests: usize,
    pub active_consultants: usize,
    /// Sum of the fees of completed requests.
    pub revenue: Decimal,
    /// Messages on those requests that others wrote and nobody has read.
    pub unread_messages: usize,
}

impl DashboardStats {
    pub fn from_requests<'a>(
        requests: impl IntoIterator<Item = &'a ServiceRequest>,
        active_consultants: usize,
    ) -> Self {
        let mut stats = Self {
            active_consultants,
            ..Self::default()
        };
        for request in requests {
            stats.total_requests += 1;
            match request.status().bucket() {
                StatusBucket::Pending => stats.pending_requests += 1,
                StatusBucket::Active => stats.active_requests += 1,
                StatusBucket::Completed => {
                    stats.completed_requests += 1;
                    stats.revenue += request.fee();
                }
            }
        }
        stats
    }
}

impl<R: PortalRepository + ?Sized> Portal<'_, R> {
    /// Statistics over the requests visible to the session.
    pub async fn dashboard(
        &self,
        session: &Session,
    ) -> Result<DashboardStats, PortalError> {
        let requests = self.visible_requests(session, None).await?;
        let active_consultants = self
            .repo
            .list_users(Some(UserRole::Consultant))
            .await?
            .iter()
            .filter(|u| u.is_active)
            .count();
        let mut stats = DashboardStats::from_requests(&requests, active_consultants);
        stats.unread_messages = self.unread_in(session, &requests).await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{EntityType, ServiceCategory, ServiceType};
    use crate::portal::RequestDraft;
    use crate::portal::test_support::{ADMIN, CONSULTANT, CUSTOMER, seeded};
    use crate::rate_card::RateCardKey;

    fn draft(service: ServiceType) -> RequestDraft {
        RequestDraft {
            title: "Dispute".to_string(),
            description: String::new(),
            category: ServiceCategory::Gst,
            key: RateCardKey::new(1, EntityType::Company, service).unwrap(),
        }
    }

    #[tokio::test]
    async fn empty_dashboard() {
        let (repo, _) = seeded().await;
        let admin = Session::open(&repo, ADMIN).await.unwrap();

        let stats = Portal::new(&repo).dashboard(&admin).await.unwrap();

        assert_eq!(
            stats,
            DashboardStats {
                active_consultants: 1,
                ..DashboardStats::default()
            }
        );
    }

    #[tokio::test]
    async fn buckets_and_revenue() {
        let (repo, ids) = seeded().await;
        let customer = Session::open(&repo, CUSTOMER).await.unwrap();
        let consultant = Session::open(&repo, CONSULTANT).await.unwrap();
        let admin = Session::open(&repo, ADMIN).await.unwrap();
        let portal = Portal::new(&repo);

        // transfer = 25000, assessment = 10000, notices = 7500
        let done = portal.submit_request(&customer, draft(ServiceType::Transfer)).await.unwrap().id;
        let active = portal.submit_request(&customer, draft(ServiceType::Assessment)).await.unwrap().id;
        portal.submit_request(&customer, draft(ServiceType::Notices)).await.unwrap();
        for id in [done, active] {
            portal.assign_request(&admin, id, ids.consultant).await.unwrap();
            portal.accept_request(&consultant, id).await.unwrap();
        }
        portal.complete_request(&consultant, done).await.unwrap();
        portal
            .send_message(&consultant, active, "Need the demand order".to_string())
            .await
            .unwrap();

        let stats = portal.dashboard(&admin).await.unwrap();

        assert_eq!(
            stats,
            DashboardStats {
                total_requests: 3,
                pending_requests: 1,
                active_requests: 1,
                completed_requests: 1,
                active_consultants: 1,
                revenue: dec!(25000),
                unread_messages: 1,
            }
        );
        assert_eq!(portal.dashboard(&consultant).await.unwrap().total_requests, 2);
        assert_eq!(portal.dashboard(&consultant).await.unwrap().unread_messages, 0);
        assert_eq!(portal.dashboard(&customer).await.unwrap().unread_messages, 1);
    }
}
