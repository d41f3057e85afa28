use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    domain::{errors::JWTError, fields::Claims},
};

pub fn generate_auth_token(uid: &Uuid, jwt_config: &JwtConfig) -> Result<String, JWTError> {
    let exp = SystemTime::now() + Duration::from_secs(jwt_config.exp);
    let claims = Claims {
        iss: jwt_config.iss.clone(),
        sub: uid.to_string(),
        exp: exp.duration_since(UNIX_EPOCH).unwrap().as_secs() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.expose_secret().as_ref()),
    )
    .map_err(|e| {
        tracing::error!("auth token generation failed >>> {}", e);
        JWTError::GenerationFailed(e.into_kind())
    })?;

    Ok(token)
}

pub fn decode_auth_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, JWTError> {
    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(jwt_config.secret.expose_secret().as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::error!("auth token decode failed >>> {}", e);
        JWTError::DecodeFailed(e.into_kind())
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: Secret::new("test-secret".to_string()),
            iss: "referly-server".to_string(),
            exp: 3600,
        }
    }

    #[test]
    fn token_round_trips_the_subject() {
        let config = test_config();
        let uid = Uuid::new_v4();

        let token = generate_auth_token(&uid, &config).unwrap();
        let claims = decode_auth_token(&token, &config).unwrap();

        assert_eq!(claims.sub, uid.to_string());
        assert_eq!(claims.iss, config.iss);
    }

    #[test]
    fn token_fails_against_a_different_secret() {
        let token = generate_auth_token(&Uuid::new_v4(), &test_config()).unwrap();

        let other = JwtConfig {
            secret: Secret::new("other-secret".to_string()),
            ..test_config()
        };
        assert!(decode_auth_token(&token, &other).is_err());
    }
}
