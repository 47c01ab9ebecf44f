use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::db::{
    self, DbPool, assignment_store::AssignmentStore, order_store::OrderStore,
    product_store::ProductStore, school_store::SchoolStore, supervisor_store::SupervisorStore,
    user_store::UserStore,
};
use crate::models::{
    assignment::AssignmentInput,
    order::{OrderItem, OrderStatus, OrderSubmission},
    product::{NewProduct, Product},
    school::{School, SchoolInput},
    supervisor::{Supervisor, SupervisorInput},
};
use crate::services::notification_service::{NotificationService, Notifier, NotifyError};
use crate::services::order_service::{OrderError, OrderService};

/// Notifier double that records every message instead of delivering it
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("notifier lock poisoned")
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Notifier double whose delivery always fails
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

/// Shared test fixture: an in-memory database with all stores and the
/// order workflow wired to a recording notifier.
struct TestHarness {
    pool: DbPool,
    products: ProductStore,
    schools: SchoolStore,
    supervisors: SupervisorStore,
    assignments: AssignmentStore,
    orders: OrderStore,
    order_service: OrderService,
    notifications: Arc<NotificationService>,
    notifier: Arc<RecordingNotifier>,
}

impl TestHarness {
    async fn new() -> Self {
        let pool = db::init_db_pool("sqlite::memory:", 1)
            .await
            .expect("failed to initialize test database");

        let notifier = Arc::new(RecordingNotifier::default());
        let notifications = Arc::new(NotificationService::new(pool.clone(), notifier.clone()));

        Self {
            products: ProductStore::new(pool.clone()),
            schools: SchoolStore::new(pool.clone()),
            supervisors: SupervisorStore::new(pool.clone()),
            assignments: AssignmentStore::new(pool.clone()),
            orders: OrderStore::new(pool.clone()),
            order_service: OrderService::new(pool.clone(), notifications.clone()),
            notifications,
            notifier,
            pool,
        }
    }

    async fn create_product(&self, name: &str, code: &str, quantity: i64) -> Product {
        self.products
            .create(NewProduct {
                name: name.to_string(),
                code: code.to_string(),
                quantity,
            })
            .await
            .expect("failed to create product")
    }

    async fn create_school(&self, name: &str) -> School {
        self.schools
            .create(SchoolInput {
                name: name.to_string(),
                address: "Av. Central 100".to_string(),
            })
            .await
            .expect("failed to create school")
    }

    async fn create_supervisor(&self, email: &str) -> Supervisor {
        self.supervisors
            .create(SupervisorInput {
                name: "Maria".to_string(),
                surname: "Lopez".to_string(),
                email: email.to_string(),
            })
            .await
            .expect("failed to create supervisor")
    }

    /// School with one supervisor assigned, ready to accept orders
    async fn create_supervised_school(&self, name: &str, email: &str) -> School {
        let school = self.create_school(name).await;
        let supervisor = self.create_supervisor(email).await;

        self.assignments
            .create(AssignmentInput {
                supervisor_id: supervisor.id,
                school_id: school.id,
            })
            .await
            .expect("failed to create assignment");

        school
    }

    /// Move an order's creation timestamp back in time
    async fn backdate_order(&self, order_id: i64, days: i64) {
        sqlx::query("UPDATE orders SET created_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(days))
            .bind(order_id)
            .execute(&self.pool)
            .await
            .expect("failed to backdate order");
    }

    async fn order_count(&self) -> usize {
        self.orders.get_all().await.expect("failed to list orders").len()
    }

    async fn line_count(&self) -> i64 {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_lines")
            .fetch_one(&self.pool)
            .await
            .expect("failed to count order lines");
        count.0
    }
}

fn submission(school: &School, items: &[(i64, i64)]) -> OrderSubmission {
    OrderSubmission {
        school_token: school.token.clone(),
        requester_name: "Directora Ramirez".to_string(),
        notes: "Entrega antes del viernes".to_string(),
        items: items
            .iter()
            .map(|&(product_id, quantity)| OrderItem {
                product_id,
                quantity,
            })
            .collect(),
    }
}

#[cfg(test)]
mod order_submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_submission_creates_pending_order_with_lines() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 50).await;
        let pencil = h.create_product("Pencil", "PC-02", 50).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 2), (pencil.id, 3)]))
            .await
            .expect("submission failed");

        assert_eq!(detail.order.school_id, school.id);
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert!(detail.order.approved_at.is_none());
        assert_eq!(detail.lines.len(), 2);

        // Retrievable through the admin detail view with the same lines
        let reloaded = h
            .orders
            .get_detail(detail.order.id)
            .await
            .expect("detail lookup failed");
        assert_eq!(reloaded.lines.len(), 2);
        assert!(
            reloaded
                .lines
                .iter()
                .any(|l| l.product_id == notebook.id && l.quantity == 2)
        );
        assert!(
            reloaded
                .lines
                .iter()
                .any(|l| l.product_id == pencil.id && l.quantity == 3)
        );

        // Submission never touches stock
        let notebook_after = h.products.get_by_id(notebook.id).await.expect("product lookup");
        assert_eq!(notebook_after.quantity, 50);
    }

    #[tokio::test]
    async fn test_unknown_school_token_rejected() {
        let h = TestHarness::new().await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let sub = OrderSubmission {
            school_token: "no-such-token".to_string(),
            requester_name: "Directora Ramirez".to_string(),
            notes: String::new(),
            items: vec![OrderItem {
                product_id: product.id,
                quantity: 1,
            }],
        };

        let err = h.order_service.submit(sub).await.unwrap_err();
        assert!(matches!(err, OrderError::UnknownSchool));
        assert_eq!(h.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_school_without_supervisor_rejected() {
        let h = TestHarness::new().await;
        let school = h.create_school("Escuela sin supervisor").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let err = h
            .order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::NoSupervisor));
        assert_eq!(h.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_third_order_within_window_rejected() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        for _ in 0..2 {
            h.order_service
                .submit(submission(&school, &[(product.id, 1)]))
                .await
                .expect("submission within limit failed");
        }

        let err = h
            .order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::WeeklyLimitReached));
        assert_eq!(h.order_count().await, 2);
        assert_eq!(h.line_count().await, 2);
    }

    #[tokio::test]
    async fn test_order_outside_rolling_window_does_not_count() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let first = h
            .order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("first submission failed");
        h.order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("second submission failed");

        // Age the first order past the rolling window; a third submission
        // is allowed again
        h.backdate_order(first.order.id, 8).await;

        h.order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("submission after window expired failed");

        assert_eq!(h.order_count().await, 3);
    }

    #[tokio::test]
    async fn test_limit_is_per_school() {
        let h = TestHarness::new().await;
        let school_a = h.create_supervised_school("Escuela A", "a@distrito.edu").await;
        let school_b = h.create_supervised_school("Escuela B", "b@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        for _ in 0..2 {
            h.order_service
                .submit(submission(&school_a, &[(product.id, 1)]))
                .await
                .expect("school A submission failed");
        }

        // School B is unaffected by school A's exhausted limit
        h.order_service
            .submit(submission(&school_b, &[(product.id, 1)]))
            .await
            .expect("school B submission failed");
    }

    #[tokio::test]
    async fn test_quantity_above_cap_rejects_whole_submission() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 50).await;
        let pencil = h.create_product("Pencil", "PC-02", 50).await;

        let err = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 2), (pencil.id, 4)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::QuantityLimitExceeded(id) if id == pencil.id));
        assert_eq!(h.order_count().await, 0);
        assert_eq!(h.line_count().await, 0);
    }

    #[tokio::test]
    async fn test_split_entries_cannot_evade_quantity_cap() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 50).await;

        // 2 + 2 for the same product collapses to 4 and is refused
        let err = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 2), (notebook.id, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::QuantityLimitExceeded(_)));
        assert_eq!(h.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_all_zero_submission_rejected() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let err = h
            .order_service
            .submit(submission(&school, &[(product.id, 0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::EmptyOrder));
        assert_eq!(h.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_items_are_dropped() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 50).await;
        let pencil = h.create_product("Pencil", "PC-02", 50).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 2), (pencil.id, 0)]))
            .await
            .expect("submission failed");

        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].product_id, notebook.id);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected_without_rows() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 50).await;

        let err = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 1), (9999, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::UnknownProduct(9999)));
        assert_eq!(h.order_count().await, 0);
        assert_eq!(h.line_count().await, 0);
    }

    #[tokio::test]
    async fn test_blank_requester_rejected() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let mut sub = submission(&school, &[(product.id, 1)]);
        sub.requester_name = "   ".to_string();

        let err = h.order_service.submit(sub).await.unwrap_err();
        assert!(matches!(err, OrderError::MissingRequester));
        assert_eq!(h.order_count().await, 0);
    }
}

#[cfg(test)]
mod order_approval_tests {
    use super::*;

    #[tokio::test]
    async fn test_approval_decrements_stock_and_stamps_time() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 40).await;
        let pencil = h.create_product("Pencil", "PC-02", 30).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 3), (pencil.id, 1)]))
            .await
            .expect("submission failed");

        let approved = h
            .order_service
            .approve(detail.order.id)
            .await
            .expect("approval failed");

        assert_eq!(approved.status, OrderStatus::Approved);
        assert!(approved.approved_at.is_some());

        let notebook_after = h.products.get_by_id(notebook.id).await.expect("lookup");
        let pencil_after = h.products.get_by_id(pencil.id).await.expect("lookup");
        assert_eq!(notebook_after.quantity, 37);
        assert_eq!(pencil_after.quantity, 29);
    }

    #[tokio::test]
    async fn test_second_approval_rejected_with_single_decrement() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 40).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 3)]))
            .await
            .expect("submission failed");

        h.order_service
            .approve(detail.order.id)
            .await
            .expect("first approval failed");

        let err = h.order_service.approve(detail.order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyProcessed));

        // Exactly one decrement cycle
        let notebook_after = h.products.get_by_id(notebook.id).await.expect("lookup");
        assert_eq!(notebook_after.quantity, 37);
    }

    #[tokio::test]
    async fn test_approval_is_all_or_nothing() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let a = h.create_product("Notebook", "NB-01", 5).await;
        let b = h.create_product("Pencil", "PC-02", 0).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(a.id, 3), (b.id, 2)]))
            .await
            .expect("submission failed");

        let err = h.order_service.approve(detail.order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock(ref name) if name == "Pencil"));

        // No partial decrement of A, order still pending
        let a_after = h.products.get_by_id(a.id).await.expect("lookup");
        let b_after = h.products.get_by_id(b.id).await.expect("lookup");
        assert_eq!(a_after.quantity, 5);
        assert_eq!(b_after.quantity, 0);

        let order = h.orders.get_by_id(detail.order.id).await.expect("lookup");
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_rejected_order_cannot_be_approved() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 40).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 2)]))
            .await
            .expect("submission failed");

        let rejected = h
            .order_service
            .reject(detail.order.id)
            .await
            .expect("rejection failed");
        assert_eq!(rejected.status, OrderStatus::Rejected);
        assert!(rejected.approved_at.is_none());

        let err = h.order_service.approve(detail.order.id).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyProcessed));

        // Rejection never touches stock
        let notebook_after = h.products.get_by_id(notebook.id).await.expect("lookup");
        assert_eq!(notebook_after.quantity, 40);
    }

    #[tokio::test]
    async fn test_approve_missing_order() {
        let h = TestHarness::new().await;

        let err = h.order_service.approve(41).await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound));
    }
}

#[cfg(test)]
mod low_stock_tests {
    use super::*;

    #[tokio::test]
    async fn test_check_is_idempotent_and_mutates_nothing() {
        let h = TestHarness::new().await;
        let low = h.create_product("Glue", "GL-01", 4).await;
        h.create_product("Notebook", "NB-01", 50).await;

        let first = h.notifications.check_low_stock().await;
        let second = h.notifications.check_low_stock().await;

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, low.id);
        assert_eq!(second[0].id, low.id);

        let low_after = h.products.get_by_id(low.id).await.expect("lookup");
        assert_eq!(low_after.quantity, 4);

        // One equivalent message per invocation
        let messages = h.notifier.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].1, messages[1].1);
        assert!(messages[0].1.contains("Glue (GL-01): 4 on hand"));
    }

    #[tokio::test]
    async fn test_no_notification_when_stock_is_healthy() {
        let h = TestHarness::new().await;
        h.create_product("Notebook", "NB-01", 50).await;

        let low = h.notifications.check_low_stock().await;

        assert!(low.is_empty());
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_approval_crossing_threshold_notifies() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let notebook = h.create_product("Notebook", "NB-01", 12).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(notebook.id, 3)]))
            .await
            .expect("submission failed");
        let before_approval = h.notifier.messages().len();

        h.order_service
            .approve(detail.order.id)
            .await
            .expect("approval failed");

        // 12 - 3 = 9 on hand, under the threshold
        let messages = h.notifier.messages();
        assert!(messages.len() > before_approval);
        assert!(messages.last().expect("no messages").1.contains("Notebook"));
    }

    #[tokio::test]
    async fn test_delivery_failure_never_blocks_the_workflow() {
        let pool = db::init_db_pool("sqlite::memory:", 1)
            .await
            .expect("failed to initialize test database");
        let notifications = Arc::new(NotificationService::new(pool.clone(), Arc::new(FailingNotifier)));
        let order_service = OrderService::new(pool.clone(), notifications.clone());

        let schools = SchoolStore::new(pool.clone());
        let supervisors = SupervisorStore::new(pool.clone());
        let assignments = AssignmentStore::new(pool.clone());
        let products = ProductStore::new(pool.clone());

        let school = schools
            .create(SchoolInput {
                name: "Escuela 12".to_string(),
                address: "Av. Central 100".to_string(),
            })
            .await
            .expect("school");
        let supervisor = supervisors
            .create(SupervisorInput {
                name: "Maria".to_string(),
                surname: "Lopez".to_string(),
                email: "m.lopez@distrito.edu".to_string(),
            })
            .await
            .expect("supervisor");
        assignments
            .create(AssignmentInput {
                supervisor_id: supervisor.id,
                school_id: school.id,
            })
            .await
            .expect("assignment");
        let product = products
            .create(NewProduct {
                name: "Glue".to_string(),
                code: "GL-01".to_string(),
                quantity: 4,
            })
            .await
            .expect("product");

        // Stock already under the threshold, so both calls hit the failing
        // notifier and still succeed
        let detail = order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("submission should survive notifier failure");
        let approved = order_service
            .approve(detail.order.id)
            .await
            .expect("approval should survive notifier failure");

        assert_eq!(approved.status, OrderStatus::Approved);
    }
}

#[cfg(test)]
mod assignment_tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_duplicate_pair_rejected() {
        let h = TestHarness::new().await;
        let school = h.create_school("Escuela 12").await;
        let supervisor = h.create_supervisor("m.lopez@distrito.edu").await;

        h.assignments
            .create(AssignmentInput {
                supervisor_id: supervisor.id,
                school_id: school.id,
            })
            .await
            .expect("first assignment failed");

        let err = h
            .assignments
            .create(AssignmentInput {
                supervisor_id: supervisor.id,
                school_id: school.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_first_assignment_is_primary() {
        let h = TestHarness::new().await;
        let school = h.create_school("Escuela 12").await;
        let sup1 = h.create_supervisor("uno@distrito.edu").await;
        let sup2 = h.create_supervisor("dos@distrito.edu").await;

        let a1 = h
            .assignments
            .create(AssignmentInput {
                supervisor_id: sup1.id,
                school_id: school.id,
            })
            .await
            .expect("assignment failed");
        let a2 = h
            .assignments
            .create(AssignmentInput {
                supervisor_id: sup2.id,
                school_id: school.id,
            })
            .await
            .expect("assignment failed");

        assert!(a1.is_primary);
        assert!(!a2.is_primary);

        let primary = h
            .assignments
            .get_primary_for_school(school.id)
            .await
            .expect("primary lookup failed")
            .expect("no primary assignment");
        assert_eq!(primary.id, a1.id);
    }

    #[tokio::test]
    async fn test_deleting_primary_promotes_oldest_remaining() {
        let h = TestHarness::new().await;
        let school = h.create_school("Escuela 12").await;
        let sup1 = h.create_supervisor("uno@distrito.edu").await;
        let sup2 = h.create_supervisor("dos@distrito.edu").await;

        let a1 = h
            .assignments
            .create(AssignmentInput {
                supervisor_id: sup1.id,
                school_id: school.id,
            })
            .await
            .expect("assignment failed");
        let a2 = h
            .assignments
            .create(AssignmentInput {
                supervisor_id: sup2.id,
                school_id: school.id,
            })
            .await
            .expect("assignment failed");

        h.assignments.delete(a1.id).await.expect("delete failed");

        let primary = h
            .assignments
            .get_primary_for_school(school.id)
            .await
            .expect("primary lookup failed")
            .expect("no primary after promotion");
        assert_eq!(primary.id, a2.id);
    }

    #[tokio::test]
    async fn test_assignment_delete_keeps_orders_but_stops_routing() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let detail = h
            .order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("submission failed");

        let all = h.assignments.get_all().await.expect("listing failed");
        for assignment in all {
            h.assignments.delete(assignment.id).await.expect("delete failed");
        }

        // Existing order survives the unassignment
        let order = h.orders.get_by_id(detail.order.id).await.expect("lookup");
        assert_eq!(order.status, OrderStatus::Pending);

        // New submissions have nowhere to be routed
        let err = h
            .order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NoSupervisor));
    }

    #[tokio::test]
    async fn test_supervisor_delete_promotes_replacement() {
        let h = TestHarness::new().await;
        let school = h.create_school("Escuela 12").await;
        let sup1 = h.create_supervisor("uno@distrito.edu").await;
        let sup2 = h.create_supervisor("dos@distrito.edu").await;

        h.assignments
            .create(AssignmentInput {
                supervisor_id: sup1.id,
                school_id: school.id,
            })
            .await
            .expect("assignment failed");
        h.assignments
            .create(AssignmentInput {
                supervisor_id: sup2.id,
                school_id: school.id,
            })
            .await
            .expect("assignment failed");

        h.supervisors.delete(sup1.id).await.expect("delete failed");

        let primary = h
            .assignments
            .get_primary_for_school(school.id)
            .await
            .expect("primary lookup failed")
            .expect("no primary after supervisor deletion");
        assert_eq!(primary.supervisor_id, sup2.id);
    }
}

#[cfg(test)]
mod catalog_tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::product::ProductUpdate;

    #[tokio::test]
    async fn test_duplicate_product_code_conflict() {
        let h = TestHarness::new().await;
        h.create_product("Notebook", "NB-01", 50).await;

        let err = h
            .products
            .create(NewProduct {
                name: "Other notebook".to_string(),
                code: "NB-01".to_string(),
                quantity: 10,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));

        // The failed insert left a single product behind
        let all = h.products.get_all().await.expect("listing failed");
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_product_update_keeps_stock() {
        let h = TestHarness::new().await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let updated = h
            .products
            .update(
                product.id,
                ProductUpdate {
                    name: "Spiral notebook".to_string(),
                    code: "NB-01A".to_string(),
                },
            )
            .await
            .expect("update failed");

        assert_eq!(updated.name, "Spiral notebook");
        assert_eq!(updated.quantity, 50);
    }

    #[tokio::test]
    async fn test_stock_edit_rejects_negative() {
        let h = TestHarness::new().await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        let err = h.products.set_stock(product.id, -1).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let unchanged = h.products.get_by_id(product.id).await.expect("lookup");
        assert_eq!(unchanged.quantity, 50);
    }

    #[tokio::test]
    async fn test_school_delete_refused_with_orders() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        h.order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("submission failed");

        let err = h.schools.delete(school.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Still present
        h.schools.get_by_id(school.id).await.expect("school vanished");
    }

    #[tokio::test]
    async fn test_product_referenced_by_order_cannot_be_deleted() {
        let h = TestHarness::new().await;
        let school = h.create_supervised_school("Escuela 12", "m.lopez@distrito.edu").await;
        let product = h.create_product("Notebook", "NB-01", 50).await;

        h.order_service
            .submit(submission(&school, &[(product.id, 1)]))
            .await
            .expect("submission failed");

        let err = h.products.delete(product.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_school_tokens_are_unique() {
        let h = TestHarness::new().await;
        let a = h.create_school("Escuela A").await;
        let b = h.create_school("Escuela B").await;

        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), 10);
    }
}

#[cfg(test)]
mod auth_tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::auth_service::{self, AuthService};

    #[tokio::test]
    async fn test_login_roundtrip_and_token_verification() {
        let h = TestHarness::new().await;
        let users = UserStore::new(h.pool.clone());
        let auth = AuthService::new(h.pool.clone(), "test-secret", 3600);

        let hash = auth_service::hash_password("correct horse").expect("hashing failed");
        users
            .create_user("admin", "admin@distrito.edu", &hash, true)
            .await
            .expect("user creation failed");

        let response = auth
            .login("admin", "correct horse")
            .await
            .expect("login failed");
        assert!(response.user.is_admin);

        let principal = auth
            .verify_token(&response.token)
            .await
            .expect("token verification failed");
        assert_eq!(principal.username, "admin");
        assert!(principal.is_admin);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let h = TestHarness::new().await;
        let users = UserStore::new(h.pool.clone());
        let auth = AuthService::new(h.pool.clone(), "test-secret", 3600);

        let hash = auth_service::hash_password("correct horse").expect("hashing failed");
        users
            .create_user("admin", "admin@distrito.edu", &hash, true)
            .await
            .expect("user creation failed");

        let err = auth.login("admin", "battery staple").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        // Unknown user gets the same failure shape
        let err = auth.login("nobody", "correct horse").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let h = TestHarness::new().await;
        let auth = AuthService::new(h.pool.clone(), "test-secret", 3600);

        let err = auth.verify_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_initial_admin_seeded_once() {
        let h = TestHarness::new().await;
        let users = UserStore::new(h.pool.clone());

        let hash = auth_service::hash_password("s3cret").expect("hashing failed");
        users
            .ensure_initial_admin("admin", "admin@distrito.edu", &hash)
            .await
            .expect("seeding failed");
        users
            .ensure_initial_admin("admin", "admin@distrito.edu", &hash)
            .await
            .expect("second seeding call failed");

        let admin = users
            .get_user_by_username("admin")
            .await
            .expect("lookup failed")
            .expect("admin not seeded");
        assert!(admin.is_admin);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&h.pool)
            .await
            .expect("count failed");
        assert_eq!(count.0, 1);
    }
}
