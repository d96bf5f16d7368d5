use std::sync::Arc;

use crate::auth::{JwtConfig, JwtService};
use crate::core::{Config, Result};
use crate::curriculum::CurriculumStore;
use crate::reorder::{ReorderService, StructureEvent};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | structure | Arc<ReorderService> | 课程结构服务 (redb) |
/// | jwt | Arc<JwtService> | 令牌验证 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 课程结构服务
    pub structure: Arc<ReorderService>,
    /// JWT 令牌服务
    pub jwt: Arc<JwtService>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 密钥配置无效时失败，见 [`JwtConfig::from_config`]
    pub fn new(config: Config, store: CurriculumStore) -> Result<Self> {
        let jwt = JwtService::with_config(JwtConfig::from_config(&config)?);
        Ok(Self {
            config,
            structure: Arc::new(ReorderService::new(store)),
            jwt: Arc::new(jwt),
        })
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt
    }

    /// 按配置打开数据库并初始化状态
    pub fn initialize(config: &Config) -> Result<Self> {
        let store = if config.is_in_memory() {
            tracing::warn!("Using in-memory database, data will not survive a restart");
            CurriculumStore::open_in_memory()?
        } else {
            if let Some(parent) = std::path::Path::new(&config.database_path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            CurriculumStore::open(&config.database_path)?
        };

        tracing::info!(
            database = %config.database_path,
            courses = store.course_count()?,
            "Curriculum store opened"
        );
        Self::new(config.clone(), store)
    }

    /// 启动后台任务
    ///
    /// 目前只有结构变更日志：记录每个失效的作用域，供缓存层排查。
    pub fn start_background_tasks(&self) {
        let mut rx = self.structure.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(StructureEvent::ScopeInvalidated { scope, version }) => {
                        tracing::debug!(scope = %scope, version, "Structure scope invalidated");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Structure event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
