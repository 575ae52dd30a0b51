use std::sync::Arc;

use auth::TokenError;
use tonic::Status;

use crate::domain::user::ports::SessionServicePort;
use crate::proto::IssueTokenRequest;
use crate::proto::IssueTokenResponse;
use crate::user::errors::UserError;

pub async fn issue_token(
    service: Arc<dyn SessionServicePort>,
    request: IssueTokenRequest,
) -> Result<IssueTokenResponse, Status> {
    match service
        .issue_tokens(request.subject_id, &request.role)
        .await
    {
        Ok(pair) => {
            tracing::info!(
                subject_id = request.subject_id,
                role = %request.role,
                "Tokens issued over rpc"
            );
            Ok(pair.into())
        }
        Err(UserError::Token(TokenError::UnknownRole(role))) => {
            Err(Status::invalid_argument(format!("unknown type: {role}")))
        }
        Err(e) => {
            tracing::error!(error = %e, subject_id = request.subject_id, "Token issuance failed");
            Err(Status::internal("new token failed"))
        }
    }
}
