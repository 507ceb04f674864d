use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "vestia".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "vestia-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(240),
        };
        let mail = MailConfig {
            smtp_host: std::env::var("EMAIL_HOST").unwrap_or_else(|_| "localhost".into()),
            smtp_port: std::env::var("EMAIL_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("EMAIL_USER").unwrap_or_default(),
            smtp_password: std::env::var("EMAIL_PASS").unwrap_or_default(),
            from_address: std::env::var("EMAIL_FROM")
                .or_else(|_| std::env::var("EMAIL_USER"))
                .unwrap_or_default(),
        };
        let allowed_origin = std::env::var("ALLOWED_ORIGIN").ok();
        Ok(Self {
            database_url,
            jwt,
            mail,
            allowed_origin,
        })
    }
}
