#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    pub const HEALTH: &'static str = "/health";

    // Auth - JSON APIs
    pub const LOGIN: &'static str = "/api/login";
    pub const PASSWORD_CODE: &'static str = "/api/password-code";
    pub const PASSWORD: &'static str = "/api/password";
    pub const ENTITY: &'static str = "/api/entity";

    // Admin - JSON APIs
    pub const CATEGORIES: &'static str = "/api/categories";
    pub const CATEGORY_BY_ID: &'static str = "/api/categories/:id";
    pub const CATEGORY_SAMPLES: &'static str = "/api/category-samples";
    pub const CLASSIFIER_TRAIN: &'static str = "/api/category-samples/classifier";
    pub const CLASSIFIER_TRAINING: &'static str = "/api/category-samples/classifier/training";
    pub const ORGANIZATIONS: &'static str = "/api/organizations";
    pub const ORGANIZATION_BY_ID: &'static str = "/api/organizations/:id";

    // Organization - JSON APIs
    pub const OPERATORS: &'static str = "/api/operators";
    pub const OPERATOR_BY_ID: &'static str = "/api/operators/:id";
    pub const OWNERS: &'static str = "/api/owners";
    pub const OWNER_BY_ID: &'static str = "/api/owners/:id";

    // Tickets - JSON APIs
    pub const OPERATOR_REQUESTS: &'static str = "/api/operator/requests";
    pub const OPERATOR_REQUEST_CLAIM: &'static str = "/api/operator/requests/:id/claim";
    pub const OPERATOR_REQUEST_FINALIZE: &'static str = "/api/operator/requests/:id/finalize";
    pub const OWNER_REQUESTS: &'static str = "/api/owner/requests";
}
