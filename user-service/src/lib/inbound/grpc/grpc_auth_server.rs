use std::sync::Arc;

use tonic::Request;
use tonic::Response;
use tonic::Status;

use super::handlers::issue_token;
use crate::domain::user::ports::SessionServicePort;
use crate::proto::auth_service_server::AuthService as AuthServiceProto;
use crate::proto::IssueTokenRequest;
use crate::proto::IssueTokenResponse;

pub struct AuthGrpcService {
    service: Arc<dyn SessionServicePort>,
}

impl AuthGrpcService {
    pub fn new(service: Arc<dyn SessionServicePort>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl AuthServiceProto for AuthGrpcService {
    async fn issue_token(
        &self,
        request: Request<IssueTokenRequest>,
    ) -> Result<Response<IssueTokenResponse>, Status> {
        let response =
            issue_token::issue_token(self.service.clone(), request.into_inner()).await?;
        Ok(Response::new(response))
    }
}
